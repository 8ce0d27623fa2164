use crate::commands::CmdResult;
use crate::config::CalloutConfig;
use crate::error::Result;

/// The effective configuration, for display.
pub fn run(config: &CalloutConfig) -> Result<CmdResult> {
    Ok(CmdResult::default().with_config(config.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_returned_as_is() {
        let config = CalloutConfig {
            master_folder: "Masters".to_string(),
            ..Default::default()
        };
        let result = run(&config).unwrap();
        assert_eq!(result.config, Some(config));
        assert!(result.messages.is_empty());
    }
}
