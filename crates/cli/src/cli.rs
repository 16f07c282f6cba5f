use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wallet connection and raffle tooling for the raffle app.
#[derive(Debug, Parser)]
#[command(name = "rw", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the wallet bridge host executable. Falls back to
    /// $RW_WALLET_BRIDGE, then `wallet-bridge` on PATH.
    #[arg(long, global = true)]
    pub bridge: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect the wallet and steer it onto Avalanche C-Chain
    Connect {
        /// Company to continue with after connecting; decides whether
        /// you land on the manager dashboard or registration
        #[arg(long)]
        company: Option<String>,
    },
    /// Show the current wallet state without prompting
    Status,
    /// Raffle draft tooling
    #[command(subcommand)]
    Raffle(RaffleCommand),
}

#[derive(Debug, Subcommand)]
pub enum RaffleCommand {
    /// Validate a raffle draft and print the execute payload
    Plan {
        /// Prize pool in AVAX, e.g. 1.5
        #[arg(long)]
        prize: String,

        /// Number of winners drawn
        #[arg(long, default_value_t = 1)]
        winners: u32,

        /// Draw date, YYYY-MM-DD
        #[arg(long)]
        date: chrono::NaiveDate,

        /// Draw hour, 0-23
        #[arg(long, default_value_t = 12)]
        hour: u32,

        /// Draw minute, 0-59
        #[arg(long, default_value_t = 0)]
        minute: u32,

        /// Owner wallet address (0x...)
        #[arg(long)]
        owner: Option<rw_protocol::Address>,
    },
}
