//! Status command - worker registration and partition summary

use crate::cli::commands::open_engine;
use crate::config::Config;
use crate::engine::{PartitionKind, WorkerState};
use crate::error::SwResult;
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};

/// Execute the status command
pub async fn execute(config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();
    let engine = open_engine(config).await?;
    let registration = engine.registration();
    let storage = engine.storage();

    ui::intro(&ctx, "swcache status");

    ui::section(&ctx, "Worker:");
    ui::key_value(&ctx, "Version", engine.names().version());
    ui::key_value_status(
        &ctx,
        "State",
        &registration.state.to_string(),
        registration.state == WorkerState::Activated,
    );
    ui::key_value(&ctx, "Worker ID", &registration.worker_id.to_string());
    ui::key_value(&ctx, "Installed", &timestamp(registration.installed_at));
    ui::key_value(&ctx, "Activated", &timestamp(registration.activated_at));
    ui::key_value(&ctx, "Skip waiting", &registration.skip_waiting.to_string());
    ui::key_value(&ctx, "Clients claimed", &registration.claimed.to_string());

    ui::section(&ctx, "Partitions:");
    ui::key_value(&ctx, "Storage", &storage.root().display().to_string());
    for kind in PartitionKind::all() {
        let name = engine.names().name(*kind);
        match storage.get(&name).await? {
            Some(partition) => {
                let count = partition.len().await?;
                ui::key_value_status(&ctx, &name, &format!("{} entries", count), true);
            }
            None => ui::key_value_status(&ctx, &name, "missing", false),
        }
    }

    let stale = storage
        .keys()
        .await?
        .into_iter()
        .filter(|name| !engine.names().is_current(name))
        .count();
    if stale > 0 {
        ui::step_warn_hint(
            &ctx,
            &format!("{} stale partition(s) from older versions", stale),
            "Run: swcache activate",
        );
    }

    Ok(())
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
