//! Raffle draft composition and validation.
//!
//! The create-raffle flow collects a prize amount in AVAX and a draw
//! schedule picked as a calendar date plus an hour/minute pair; the
//! chain side wants Unix seconds. This module does that composition
//! and the validation the forms rely on.

use chrono::NaiveDate;
use thiserror::Error;

use rw_protocol::Address;

/// Validation errors for a raffle draft.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("prize amount is not a number: {0:?}")]
    InvalidPrize(String),

    #[error("prize amount must be greater than zero")]
    NonPositivePrize,

    #[error("a raffle needs at least one winner")]
    NoWinners,

    #[error("invalid draw time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("draw time must be in the future")]
    EndsInPast,
}

/// Composes a calendar date and an hour/minute pair into Unix seconds
/// (UTC, seconds and below zeroed).
pub fn schedule_at(date: NaiveDate, hour: u32, minute: u32) -> Result<i64, DraftError> {
    let datetime = date
        .and_hms_opt(hour, minute, 0)
        .ok_or(DraftError::InvalidTime { hour, minute })?;
    Ok(datetime.and_utc().timestamp())
}

/// A validated raffle draft, ready to hand to the execute step.
#[derive(Debug, Clone, PartialEq)]
pub struct RaffleDraft {
    /// Prize pool in AVAX.
    pub prize_avax: f64,
    /// Number of winners drawn.
    pub num_winners: u32,
    /// Draw time in Unix seconds.
    pub end_time: i64,
    /// Owner wallet, when one is connected.
    pub owner: Option<Address>,
}

impl RaffleDraft {
    /// Validates the raw form values. `prize` is the text field as
    /// typed; `now` is the current Unix time, passed in so callers
    /// (and tests) control the clock.
    pub fn new(
        prize: &str,
        num_winners: u32,
        end_time: i64,
        owner: Option<Address>,
        now: i64,
    ) -> Result<Self, DraftError> {
        let trimmed = prize.trim();
        let prize_avax: f64 = trimmed
            .parse()
            .map_err(|_| DraftError::InvalidPrize(trimmed.to_string()))?;
        if !prize_avax.is_finite() {
            return Err(DraftError::InvalidPrize(trimmed.to_string()));
        }
        if prize_avax <= 0.0 {
            return Err(DraftError::NonPositivePrize);
        }
        if num_winners == 0 {
            return Err(DraftError::NoWinners);
        }
        if end_time <= now {
            return Err(DraftError::EndsInPast);
        }
        Ok(Self {
            prize_avax,
            num_winners,
            end_time,
            owner,
        })
    }

    /// Human-readable execute summary.
    pub fn summary(&self) -> String {
        format!(
            "Execute raffle\nPrize: {} AVAX\nWinners: {}\nTime (UNIX): {}",
            self.prize_avax, self.num_winners, self.end_time
        )
    }
}
