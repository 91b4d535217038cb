//! Fight replay binary.
//!
//! ```bash
//! FIGHT_SCENARIO=crates/client/scenarios/duel.ron cargo run -p combat-client
//! ```
use anyhow::Result;

use combat_client::{ClientConfig, run};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    tracing::debug!("Client configuration: {:?}", config);

    let summary = run(&config).await?;
    match summary.winner {
        Some(team) => println!("team {} won in {} turns", team.0, summary.reports.len()),
        None => println!("no winner after {} turns", summary.reports.len()),
    }
    Ok(())
}
