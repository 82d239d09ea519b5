//! Prompt theme

use cliclack::ThemeState;
use console::Style;

/// Green bars for swcache prompts and spinners
#[derive(Debug, Clone, Default)]
pub struct SwTheme;

impl cliclack::Theme for SwTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().cyan(),
        }
    }
}

/// Install the theme for every cliclack widget
pub fn init_theme() {
    cliclack::set_theme(SwTheme);
}
