//! Issue-key command - creates an API key against the configured store

use chrono::Utc;
use clap::Args;

use crate::config::AppConfig;

#[derive(Args, Debug, Clone)]
pub struct IssueKeyArgs {
    /// Display name for the key
    #[arg(long)]
    pub name: Option<String>,
}

/// Create the key and print the secret to stdout
pub async fn run(args: IssueKeyArgs) -> anyhow::Result<()> {
    // stdout carries only the key, so no subscriber is installed here
    let config = AppConfig::load().unwrap_or_default();

    let state = crate::create_app_state_with_config(&config).await?;
    let api_key = state
        .api_key_service
        .issue(args.name.as_deref(), Utc::now())
        .await?;

    println!("{}", api_key.key);
    eprintln!("Issued API key '{}' (id {})", api_key.name, api_key.id);

    Ok(())
}
