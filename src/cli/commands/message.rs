//! Message command - deliver a control message

use crate::cli::args::MessageArgs;
use crate::cli::commands::open_engine;
use crate::config::Config;
use crate::engine::Message;
use crate::error::SwResult;
use crate::ui::{self, UiContext};

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> SwResult<()> {
    let ctx = UiContext::detect();

    if Message::parse(&args.payload).is_none() {
        ui::step_warn_hint(
            &ctx,
            &format!("Ignored unrecognized message {:?}", args.payload),
            "The only control message is skipWaiting",
        );
        return Ok(());
    }

    let engine = open_engine(config).await?;
    match engine.handle_message(&args.payload).await? {
        Some(sweep) => ui::step_ok_detail(
            &ctx,
            &format!("Activated {}", engine.names().version()),
            &format!("{} stale partition(s) deleted", sweep.deleted.len()),
        ),
        None => ui::step_info(
            &ctx,
            &format!("Skip-waiting recorded (worker is {})", engine.state()),
        ),
    }

    Ok(())
}
