use std::sync::Arc;
use std::time::Duration;

use filefetch::config::Settings;
use filefetch::job::{FetchConfig, FetchJob};
use filefetch::store::{FjallStore, JobStore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::{FetchArgs, StatusArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn fetch(settings: &Settings, args: FetchArgs) -> Result<(), AnyError> {
    let store = Arc::new(FjallStore::open(&settings.store.path)?);
    let registry = settings.processor_registry()?;

    let id = args.id.unwrap_or_else(|| Uuid::now_v7().to_string());
    let config = FetchConfig::builder()
        .file_path(args.source)
        .maybe_destination(args.destination)
        .temporary_directory(
            args.temp_dir
                .unwrap_or_else(|| settings.transfer.temporary_directory.clone()),
        )
        .processors(args.processors)
        .keep_original_filename(args.keep_original_filename)
        .build();

    let mut job = FetchJob::get(id.as_str(), store.clone(), Some(config), &registry).await?;
    match args.time_limit {
        Some(secs) if !job.set_time_limit(Duration::from_secs(secs)) => {
            warn!(
                job_id = %id,
                processor = job.processor_name(),
                "Processor cannot stop part-way, running without a time limit"
            );
        }
        Some(_) => {}
        None => job.clear_time_limit(),
    }

    let result = job.run().await?;
    store.persist()?;
    info!(job_id = %id, status = ?result.status, "Run finished");

    let output = serde_json::json!({
        "id": id,
        "result": result,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn status(settings: &Settings, args: StatusArgs) -> Result<(), AnyError> {
    let store = FjallStore::open(&settings.store.path)?;
    let record = store
        .load(&args.id)?
        .ok_or_else(|| format!("No job stored under id {}", args.id))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn list(settings: &Settings) -> Result<(), AnyError> {
    let store = FjallStore::open(&settings.store.path)?;
    for id in store.ids()? {
        println!("{id}");
    }
    Ok(())
}
