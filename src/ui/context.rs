//! Output mode detection

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Forces plain output even on a terminal
const PLAIN_VAR: &str = "SWCACHE_PLAIN";

/// How commands should talk to the user
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    auto_yes: bool,
}

impl UiContext {
    /// Inspect the terminal and environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::terminal_attached() && !Self::plain_requested(),
            auto_yes: false,
        }
    }

    /// Plain output, prompts answered with their defaults
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    /// Answer every confirmation with yes (`--yes`)
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners and cliclack markers instead of bracketed lines
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    fn terminal_attached() -> bool {
        std::io::stdout().is_terminal() && std::io::stdin().is_terminal()
    }

    fn plain_requested() -> bool {
        std::env::var_os(PLAIN_VAR).is_some()
            || CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
    }
}
