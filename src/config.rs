use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_locale: String,
    pub target_locale: String,
    pub file_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_locale: "en-GB".to_string(),
            target_locale: "es-ES".to_string(),
            file_pattern: "{locale}.json".to_string(),
        }
    }
}

impl Config {
    /// File backing the document for a locale, per the configured pattern.
    pub fn document_path(&self, locale: &str) -> PathBuf {
        PathBuf::from(self.file_pattern.replace("{locale}", locale))
    }
}

pub fn load_config() -> Result<Config> {
    let path = PathBuf::from("langpad.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Reading config file {:?}", path))?;
    let cfg: Config = toml::from_str(&contents)
        .with_context(|| format!("Parsing config file {:?}", path))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.source_locale, "en-GB");
        assert_eq!(cfg.target_locale, "es-ES");
        assert_eq!(cfg.file_pattern, "{locale}.json");
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let cfg: Config = toml::from_str("target_locale = \"fr-FR\"").unwrap();
        assert_eq!(cfg.target_locale, "fr-FR");
        assert_eq!(cfg.source_locale, "en-GB");
    }

    #[test]
    fn document_path_fills_the_locale_pattern() {
        let cfg = Config {
            file_pattern: "locales/{locale}.json".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.document_path("de-DE"), PathBuf::from("locales/de-DE.json"));
    }
}
