//! Classify command - show how a request would be routed

use crate::cli::args::ClassifyArgs;
use crate::cli::commands::build_request;
use crate::config::Config;
use crate::engine::{rules::FALLBACK_RULE, EngineSettings};
use crate::error::SwResult;

/// Execute the classify command. Touches neither storage nor the network.
pub async fn execute(args: ClassifyArgs, config: &Config) -> SwResult<()> {
    let settings = EngineSettings::from_config(config)?;
    let request = build_request(config, &args.request)?;
    let classification = settings.rules.classify(&request);

    println!("url:   {}", request.url);
    println!("rule:  {}", classification.rule.unwrap_or(FALLBACK_RULE));
    println!("route: {}", classification.route);

    Ok(())
}
