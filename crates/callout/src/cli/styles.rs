//! Styles for the callout CLI.
//!
//! Renderers ask for a style by what the text *is* (a message level, a path, a
//! setting name) rather than by color, so the palette can change in one place.
//! `console` drops the escape codes on its own when the output is not a terminal.

use calloutapp::api::MessageLevel;
use console::Style;
use once_cell::sync::Lazy;

pub struct Theme {
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub muted: Style,
    pub key: Style,
    pub path: Style,
}

pub static THEME: Lazy<Theme> = Lazy::new(|| Theme {
    info: Style::new().dim(),
    success: Style::new().green(),
    warning: Style::new().yellow().bold(),
    error: Style::new().red().bold(),
    muted: Style::new().dim().italic(),
    key: Style::new().bold(),
    path: Style::new().cyan(),
});

impl Theme {
    pub fn for_level(&self, level: &MessageLevel) -> &Style {
        match level {
            MessageLevel::Info => &self.info,
            MessageLevel::Success => &self.success,
            MessageLevel::Warning => &self.warning,
            MessageLevel::Error => &self.error,
        }
    }
}
