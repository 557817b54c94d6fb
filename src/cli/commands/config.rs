//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command against the active configuration file.
pub fn run_config(action: &ConfigAction, settings: &Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render(settings)?);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "{} already exists. Use --force to overwrite.",
                    config_path.display()
                ));
                return Ok(());
            }
            // Keys stay in the environment
            let mut to_save = settings.clone();
            to_save.youtube.api_key = None;
            to_save.llm.api_key = None;
            to_save.save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Wrote config to {}", config_path.display()));
        }
    }

    Ok(())
}

/// Settings as TOML with API keys hidden.
fn render(settings: &Settings) -> Result<String> {
    let mut shown = settings.clone();
    for key in [&mut shown.youtube.api_key, &mut shown.llm.api_key] {
        if key.is_some() {
            *key = Some("<set>".to_string());
        }
    }
    toml::to_string_pretty(&shown).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_hides_keys() {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("sk-secret".to_string());

        let rendered = render(&settings).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<set>"));
        assert!(rendered.contains("[download]"));
    }

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine").unwrap();

        run_config(&ConfigAction::Init { force: false }, &Settings::default(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        run_config(&ConfigAction::Init { force: true }, &Settings::default(), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[general]"));
    }
}
