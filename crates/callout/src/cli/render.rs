//! Turns command results into terminal output.
//!
//! Text mode prints the effective configuration (for `config`) followed by one line
//! per message, styled by level. JSON mode prints the whole `CmdResult`.

use super::setup::OutputMode;
use super::styles::THEME;
use calloutapp::api::{CmdMessage, CmdResult};
use calloutapp::config::CalloutConfig;
use std::fmt::Write;

const KEY_WIDTH: usize = 14;

pub fn render(result: &CmdResult, mode: OutputMode) -> serde_json::Result<String> {
    match mode {
        OutputMode::Json => Ok(format!("{}\n", serde_json::to_string_pretty(result)?)),
        OutputMode::Text => Ok(render_text(result)),
    }
}

/// A background notice raised by the watch loop.
pub fn render_notice(notice: &str, mode: OutputMode) -> serde_json::Result<String> {
    let message = CmdMessage::warning(notice);
    match mode {
        OutputMode::Json => serde_json::to_string(&message),
        OutputMode::Text => Ok(render_message(&message)),
    }
}

fn render_text(result: &CmdResult) -> String {
    let mut out = String::new();
    if let Some(config) = &result.config {
        out.push_str(&render_config(config));
    }
    for message in &result.messages {
        out.push_str(&render_message(message));
        out.push('\n');
    }
    out
}

fn render_message(message: &CmdMessage) -> String {
    THEME
        .for_level(&message.level)
        .apply_to(&message.content)
        .to_string()
}

fn render_config(config: &CalloutConfig) -> String {
    let types = config.tracked_types();
    let folder = config.master_folder();
    let masters: Vec<String> = types.iter().map(|kind| config.master_path(kind)).collect();

    let mut out = String::new();
    let mut row = |key: &str, value: String| {
        let _ = writeln!(
            out,
            "{}{}",
            THEME.key.apply_to(format!("{:<width$}", key, width = KEY_WIDTH)),
            value
        );
    };

    row("types", types.join(", "));
    row(
        "master_folder",
        if folder.is_empty() {
            THEME.muted.apply_to("(vault root)").to_string()
        } else {
            THEME.path.apply_to(folder).to_string()
        },
    );
    row(
        "masters",
        masters
            .iter()
            .map(|path| THEME.path.apply_to(path).to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );
    row("debounce_ms", config.debounce_ms.to_string());
    row("suppress_ms", config.suppress_ms.to_string());
    out
}
