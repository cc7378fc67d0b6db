use clap::Parser;
use codevault::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::IssueKey(args) => cli::issue_key::run(args).await,
    }
}
