//! Activate command - claim clients and sweep stale partitions

use crate::cli::commands::open_engine;
use crate::config::Config;
use crate::error::SwResult;
use crate::ui::{self, UiContext};

/// Execute the activate command
pub async fn execute(config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();
    let engine = open_engine(config).await?;

    let sweep = engine.activate().await?;

    for name in &sweep.deleted {
        ui::step_info(&ctx, &format!("Deleted {}", name));
    }
    ui::step_ok_detail(
        &ctx,
        &format!("Activated {}", engine.names().version()),
        &format!("{} partition(s) kept", sweep.kept.len()),
    );

    Ok(())
}
