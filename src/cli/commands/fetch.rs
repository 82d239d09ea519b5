//! Fetch command - serve one request through the engine

use crate::cli::args::FetchArgs;
use crate::cli::commands::{build_request, open_engine};
use crate::config::Config;
use crate::engine::Served;
use crate::error::{SwError, SwResult};
use console::style;
use std::io::Write;

/// Execute the fetch command
///
/// The response summary goes to stderr so the body can be piped from stdout.
pub async fn execute(args: FetchArgs, config: &Config) -> SwResult<()> {
    let request = build_request(config, &args.request)?;
    let engine = open_engine(config).await?;

    let served = engine.respond(&request).await?;
    engine.settle().await;

    eprintln!("{}", summary(&served));

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &served.response.body)
                .await
                .map_err(|e| SwError::io(format!("writing {}", path.display()), e))?;
            eprintln!(
                "{} {} bytes to {}",
                style("Wrote").dim(),
                served.response.body.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&served.response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| SwError::io("writing response body", e))?;
        }
    }

    Ok(())
}

fn summary(served: &Served) -> String {
    let status = served.response.status;
    let status = if served.response.is_success() {
        style(status).green()
    } else {
        style(status).yellow()
    };
    let via = match served.strategy {
        Some(strategy) => strategy.to_string(),
        None => "pass-through".to_string(),
    };

    format!("{} {} via {}", status, served.source, style(via).cyan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Source, Strategy};
    use crate::http::Response;

    #[test]
    fn summary_names_source_and_strategy() {
        let served = Served {
            response: Response::network_error(),
            source: Source::Synthesized,
            strategy: Some(Strategy::NetworkFirst),
        };
        let line = summary(&served);
        assert!(line.contains("408"));
        assert!(line.contains("synthesized"));
        assert!(line.contains("network-first"));

        let passed = Served {
            response: Response::new(200, vec![], "ok"),
            source: Source::Network,
            strategy: None,
        };
        assert!(summary(&passed).contains("pass-through"));
    }
}
