use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::{fs, task};

use celcat_parser::{parse_calendar, reconcile, Config, EventCollection, Extraction};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let args = cli::parse(env::args().skip(1).collect());

    let extraction = decode_snapshots(&args.snapshots, args.config).await;
    info!(
        "Decoded {} events from {} snapshots, dropped {} blocks",
        extraction.events.len(),
        args.snapshots.len(),
        extraction.dropped
    );

    let stored = EventCollection::load(&args.store)
        .with_context(|| format!("Failed to read event store {}", args.store.display()))?;

    let reconciliation = reconcile(stored, extraction.events);

    if reconciliation.report.changed && !args.dry_run {
        reconciliation
            .collection
            .save(&args.store)
            .with_context(|| format!("Failed to write event store {}", args.store.display()))?;

        info!(
            "Saved {} events to {}",
            reconciliation.collection.len(),
            args.store.display()
        );
    }

    println!("{}", serde_json::to_string(&reconciliation.report)?);

    Ok(())
}

fn setup_logging() {
    let filters = env::var("LOG").unwrap_or_else(|_| "celcat_sync=info,celcat_parser=info".into());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

/// Decodes every snapshot on the blocking pool, then concatenates the results
/// in the order the files were given so later snapshots win on reconcile.
async fn decode_snapshots(paths: &[PathBuf], config: Config) -> Extraction {
    let tasks = paths
        .iter()
        .cloned()
        .map(|path| {
            task::spawn(async move {
                let html = fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Skipping snapshot {}", path.display()))?;

                let extraction = task::spawn_blocking(move || parse_calendar(html, &config)).await?;
                info!(
                    "{}: {} events, {} dropped",
                    path.display(),
                    extraction.events.len(),
                    extraction.dropped
                );

                anyhow::Ok(extraction)
            })
        })
        .collect::<Vec<_>>();

    let mut batch = Extraction::default();

    for task in tasks {
        match task.await {
            Ok(Ok(mut extraction)) => batch.append(&mut extraction),
            Ok(Err(err)) => warn!("{err:#}"),
            Err(err) => error!("Snapshot task failed: {err}"),
        }
    }

    batch
}
