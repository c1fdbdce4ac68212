//! Cache management commands

use std::path::Path;

use serde::Serialize;

use crate::cache::MONITORS_DATASET;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::models::CacheStatusDisplay;
use crate::output::formatters::format_size;
use crate::output::json::format_json;
use crate::output::table::format_table;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheReport<'a> {
    path: String,
    size_bytes: u64,
    datasets: &'a [CacheStatusDisplay],
}

/// Show the monitors dataset cache state and on-disk footprint
pub async fn status(ctx: &CommandContext) -> Result<()> {
    let key = ctx.dataset_key(None);
    let status = ctx.store.status(&key).await?;
    let displays = vec![CacheStatusDisplay::new(MONITORS_DATASET, &status)];
    let size = dir_size(&ctx.cache_dir).await;

    match ctx.format {
        OutputFormat::Json => {
            let report = CacheReport {
                path: ctx.cache_dir.display().to_string(),
                size_bytes: size,
                datasets: &displays,
            };
            println!("{}", format_json(&report)?);
        }
        _ => {
            println!("Location:   {}", ctx.cache_dir.display());
            println!("Total size: {}", format_size(size));
            println!();
            println!("{}", format_table(&displays));
        }
    }

    Ok(())
}

/// Remove every cached dataset
pub async fn clear(ctx: &CommandContext) -> Result<()> {
    let removed = ctx.store.clear().await?;

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entriesRemoved": removed,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            if removed > 0 {
                println!("Cleared {} cache entries", removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path(ctx: &CommandContext) -> Result<()> {
    println!("{}", ctx.cache_dir.display());
    Ok(())
}

/// Total size of cache entry files. Unreadable entries count as zero.
async fn dir_size(dir: &Path) -> u64 {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };

    let mut total = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            if let Ok(meta) = entry.metadata().await {
                total += meta.len();
            }
        }
    }
    total
}
