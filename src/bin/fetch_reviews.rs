use chrono::Local;
use clap::Parser;
use critic_scrape::{config::FetchArgs, info_time, process::process_catalog, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let args = FetchArgs::parse();
    process_catalog(&args).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
