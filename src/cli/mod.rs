//! CLI module for Codevault
//!
//! - `serve`: run the HTTP server
//! - `issue-key`: create an API key and print it

pub mod issue_key;
pub mod serve;

use clap::{Parser, Subcommand};

/// Codevault - issue, redeem and track activation codes
#[derive(Parser)]
#[command(name = "codevault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Create a new API key and print it
    IssueKey(issue_key::IssueKeyArgs),
}
