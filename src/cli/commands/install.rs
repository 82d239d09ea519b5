//! Install command - pre-cache the asset lists

use crate::cli::commands::open_engine;
use crate::config::Config;
use crate::engine::PartitionKind;
use crate::error::SwResult;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the install command
pub async fn execute(config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();
    let engine = open_engine(config).await?;
    let manifest = &engine.settings().manifest;
    let total: usize = PartitionKind::precached()
        .iter()
        .map(|kind| manifest.assets(*kind).len())
        .sum();

    ui::intro(&ctx, &format!("Installing {}", engine.names().version()));

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Pre-caching {} assets...", total));

    let report = match engine.install().await {
        Ok(report) => report,
        Err(e) => {
            spinner.stop_error("Install failed");
            return Err(e);
        }
    };

    let stored: usize = report.partitions.iter().map(|p| p.stored).sum();
    spinner.stop(&format!("Cached {} of {} assets", stored, total));

    for fill in &report.partitions {
        if fill.failed.is_empty() {
            ui::step_ok_detail(&ctx, &fill.name, &format!("{} entries", fill.stored));
        } else {
            ui::step_warn_hint(
                &ctx,
                &format!("{}: {} entries", fill.name, fill.stored),
                &format!("{} skipped", fill.failed.len()),
            );
            for url in &fill.failed {
                ui::remark(&ctx, url);
            }
        }
    }

    match report.activation {
        Some(sweep) => {
            ui::step_ok_detail(
                &ctx,
                "Activated",
                &format!("{} stale partition(s) deleted", sweep.deleted.len()),
            );
            ui::outro_success(&ctx, "Worker is serving requests");
        }
        None => {
            ui::step_warn_hint(
                &ctx,
                "Installed worker is waiting",
                "Run: swcache activate (or: swcache message skipWaiting)",
            );
            ui::outro_warn(&ctx, "Installed, not yet active");
        }
    }

    Ok(())
}
