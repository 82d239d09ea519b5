//! Cache command - inspect and clear cache partitions

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::engine::PartitionNames;
use crate::error::{SwError, SwResult};
use crate::registration::Registration;
use crate::storage::{CacheStorage, EntryMeta};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> SwResult<()> {
    let storage = CacheStorage::new(ConfigManager::storage_dir(config));

    match args.action {
        CacheAction::List { format } => {
            let names = PartitionNames::new(config.cache.version.clone())?;
            list_partitions(&storage, &names, format).await
        }
        CacheAction::Entries { partition, format } => {
            list_entries(&storage, &partition, format).await
        }
        CacheAction::Clear { yes } => clear_partitions(&storage, yes).await,
    }
}

#[derive(Debug, Serialize)]
struct PartitionRow {
    name: String,
    current: bool,
    entries: usize,
}

async fn partition_rows(
    storage: &CacheStorage,
    names: &PartitionNames,
) -> SwResult<Vec<PartitionRow>> {
    let mut rows = Vec::new();
    for name in storage.keys().await? {
        let entries = match storage.get(&name).await? {
            Some(partition) => partition.len().await?,
            None => 0,
        };
        rows.push(PartitionRow {
            current: names.is_current(&name),
            name,
            entries,
        });
    }
    Ok(rows)
}

/// List every partition in the storage root
async fn list_partitions(
    storage: &CacheStorage,
    names: &PartitionNames,
    format: OutputFormat,
) -> SwResult<()> {
    let rows = partition_rows(storage, names).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No cache partitions found");
                return Ok(());
            }

            println!(
                "{:<28} {:<8} {:>8}",
                style("PARTITION").bold(),
                style("STATE").bold(),
                style("ENTRIES").bold()
            );
            println!("{}", "-".repeat(46));
            for row in &rows {
                let state = if row.current {
                    style("live").green()
                } else {
                    style("stale").yellow()
                };
                println!("{:<28} {:<8} {:>8}", row.name, state, row.entries);
            }
            println!();
            println!("Total: {} partition(s)", rows.len());
        }
    }

    Ok(())
}

/// List the entries stored in one partition
async fn list_entries(storage: &CacheStorage, name: &str, format: OutputFormat) -> SwResult<()> {
    let partition = storage
        .get(name)
        .await?
        .ok_or_else(|| SwError::PartitionNotFound(name.to_string()))?;
    let entries = partition.entries().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.url);
            }
        }
        OutputFormat::Table => print_entries_table(name, &entries),
    }

    Ok(())
}

fn print_entries_table(name: &str, entries: &[EntryMeta]) {
    println!(
        "{:<6} {:>10} {:<17} {}",
        style("STATUS").bold(),
        style("BYTES").bold(),
        style("STORED").bold(),
        style("URL").bold()
    );
    println!("{}", "-".repeat(80));

    for entry in entries {
        println!(
            "{:<6} {:>10} {:<17} {}",
            entry.status,
            entry.body_len,
            entry.stored_at.format("%Y-%m-%d %H:%M"),
            entry.url
        );
    }

    println!();
    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    println!("{}: {} {}", name, entries.len(), noun);
}

/// Delete every partition and the registration record
async fn clear_partitions(storage: &CacheStorage, yes: bool) -> SwResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let names = storage.keys().await?;

    if names.is_empty() {
        ui::step_info(&ctx, "No cache partitions to clear");
        return Ok(());
    }

    let prompt = format!(
        "Delete {} partition(s) under {}?",
        names.len(),
        storage.root().display()
    );
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_info(&ctx, "Cancelled");
        return Ok(());
    }

    for name in &names {
        storage.delete(name).await?;
    }
    Registration::delete(storage.root()).await?;

    ui::step_ok_detail(
        &ctx,
        "Cache cleared",
        &format!("{} partition(s) removed", names.len()),
    );
    Ok(())
}
