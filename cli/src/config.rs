use anyhow::Context;
use lucky_charm_core::Rules;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of `lucky-charm.toml`. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub save_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub locale: Option<String>,
    pub rules: Rules,
}

impl Settings {
    pub const FILE_NAME: &'static str = "lucky-charm.toml";
    const HOME_VAR: &'static str = "LUCKY_CHARM_HOME";
    const DEFAULT_HOME: &'static str = ".lucky-charm";

    /// Where the save document and default settings file live.
    pub fn data_dir() -> PathBuf {
        std::env::var_os(Self::HOME_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_HOME))
    }

    /// Reads the settings file. A missing file means defaults unless it was asked for explicitly.
    pub fn load(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        if !explicit && !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut settings: Self = toml::from_str(text)?;
        settings.rules = settings.rules.sanitized();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_settings() {
        let settings = Settings::parse(
            r#"
            save_path = "/tmp/save.json"
            locale = "es"

            [rules]
            unlock_hour = 8
            taps_required = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.save_path, Some(PathBuf::from("/tmp/save.json")));
        assert_eq!(settings.locale.as_deref(), Some("es"));
        assert_eq!(settings.rules, Rules::new(8, 3));
    }

    #[test]
    fn clamps_rules_and_rejects_unknown_keys() {
        let settings = Settings::parse("[rules]\nunlock_hour = 30").unwrap();
        assert_eq!(settings.rules.unlock_hour, 23);
        assert_eq!(settings.rules.taps_required, Rules::DEFAULT_TAPS_REQUIRED);

        assert!(Settings::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn missing_file_is_only_fine_when_implicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Settings::FILE_NAME);

        assert_eq!(Settings::load(&path, false).unwrap(), Settings::default());
        assert!(Settings::load(&path, true).is_err());
    }
}
