//! Terminal output for swcache commands
//!
//! Uses `cliclack` for spinners, prompts and step markers in an interactive
//! terminal, and falls back to plain bracketed lines (`[OK]`, `[WARN]`) in CI
//! or when output is piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use swcache::ui::{self, TaskSpinner, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Pre-caching 33 assets...");
//! spinner.stop("Cached 33 of 33 assets");
//!
//! if ui::confirm(&ctx, "Delete 4 partition(s)?", false).await? {
//!     ui::step_ok_detail(&ctx, "Cache cleared", "4 partition(s) removed");
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, remark, section, step_info,
    step_ok_detail, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
pub use theme::{init_theme, SwTheme};
