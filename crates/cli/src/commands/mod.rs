use crate::cli::{Cli, Command, RaffleCommand};

mod connect;
mod raffle;
mod status;

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Connect { company } => {
            connect::run(cli.bridge.as_deref(), company.as_deref()).await
        }
        Command::Status => status::run(cli.bridge.as_deref()).await,
        Command::Raffle(RaffleCommand::Plan {
            prize,
            winners,
            date,
            hour,
            minute,
            owner,
        }) => raffle::plan(&prize, winners, date, hour, minute, owner),
    }
}
