use chrono::Local;
use clap::Parser;
use critic_scrape::{config::ParseArgs, info_time, matrix::pivot_file, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let args = ParseArgs::parse();
    let table = pivot_file(&args.reviews_file, &args.output_file).await?;
    info_time!(
        start_time,
        "Wrote {} reviewers x {} movies to {}",
        table.reviewer_count(),
        table.movie_ids().count(),
        args.output_file.display()
    );

    Ok(())
}
