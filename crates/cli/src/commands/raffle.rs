use anyhow::Result;
use chrono::{NaiveDate, Utc};

use rw_protocol::Address;
use rw_session::raffle::{RaffleDraft, schedule_at};

pub fn plan(
    prize: &str,
    winners: u32,
    date: NaiveDate,
    hour: u32,
    minute: u32,
    owner: Option<Address>,
) -> Result<()> {
    let end_time = schedule_at(date, hour, minute)?;
    let draft = RaffleDraft::new(prize, winners, end_time, owner, Utc::now().timestamp())?;

    println!("{}", draft.summary());
    if let Some(owner) = &draft.owner {
        println!("Owner: {}", owner.truncated());
    }
    Ok(())
}
