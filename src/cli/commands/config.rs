//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_key(&settings, key, value)?;
            updated.save()?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!(
                "Saved to {}",
                Settings::default_config_path().display()
            ));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Set one dotted key (e.g. "script.qa_rounds") in the settings tree.
fn set_key(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut tree = toml::Value::try_from(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut cursor = &mut tree;
    for part in key.split('.') {
        cursor = cursor
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
    }

    *cursor = parse_scalar(value);

    tree.try_into()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))
}

/// Parse a CLI value string into the narrowest matching TOML scalar.
fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_key_updates_nested_value() {
        let settings = Settings::default();
        let updated = set_key(&settings, "script.qa_rounds", "5").unwrap();
        assert_eq!(updated.script.qa_rounds, 5);

        let updated = set_key(&settings, "tts.provider", "elevenlabs").unwrap();
        assert_eq!(updated.tts.provider, "elevenlabs");
    }

    #[test]
    fn test_set_key_rejects_unknown_key() {
        let settings = Settings::default();
        assert!(set_key(&settings, "nope.missing", "1").is_err());
    }

    #[test]
    fn test_set_key_rejects_wrong_type() {
        let settings = Settings::default();
        assert!(set_key(&settings, "script.qa_rounds", "lots").is_err());
    }
}
