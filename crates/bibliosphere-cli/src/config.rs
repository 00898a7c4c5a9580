use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bibliosphere_core::ReferenceZone;
use serde::Deserialize;

const CONFIG_ENV: &str = "BIBLIOSPHERE_CONFIG";
const TZ_ENV: &str = "BIBLIOSPHERE_TZ";
const SESSIONS_ENV: &str = "BIBLIOSPHERE_SESSIONS";

/// `~/.config/bibliosphere/config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiblioConfig {
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub sessions_path: Option<PathBuf>,
}

impl BiblioConfig {
    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join("bibliosphere").join("config.toml"))
    }

    /// Missing or malformed files fall back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Priority: --tz flag > BIBLIOSPHERE_TZ env var > config.toml > UTC
    pub fn resolve_zone(&self, flag: Option<&str>) -> Result<ReferenceZone> {
        let env_value = std::env::var(TZ_ENV).ok();
        let chosen = flag
            .map(str::to_string)
            .or(env_value)
            .or_else(|| self.time_zone.clone());

        match chosen {
            Some(value) => value.parse::<ReferenceZone>().map_err(|e| anyhow::anyhow!(e)),
            None => Ok(ReferenceZone::utc()),
        }
    }

    /// Priority: --input flag > BIBLIOSPHERE_SESSIONS env var > config.toml
    pub fn resolve_sessions_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| std::env::var(SESSIONS_ENV).ok().map(PathBuf::from))
            .or_else(|| self.sessions_path.clone())
            .context("no session source given; pass --input, set BIBLIOSPHERE_SESSIONS or sessions_path in config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn parse(content: &str) -> BiblioConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_parse_config() {
        let config = parse("time_zone = \"+02:00\"\nsessions_path = \"/data/sessions.jsonl\"\n");
        assert_eq!(config.time_zone.as_deref(), Some("+02:00"));
        assert_eq!(
            config.sessions_path,
            Some(PathBuf::from("/data/sessions.jsonl"))
        );
        assert!(parse("").time_zone.is_none());
    }

    #[test]
    #[serial]
    fn test_zone_priority() {
        std::env::remove_var(TZ_ENV);
        let config = parse("time_zone = \"+02:00\"");

        assert_eq!(config.resolve_zone(None).unwrap().to_string(), "+02:00");
        assert_eq!(
            config.resolve_zone(Some("-05:00")).unwrap().to_string(),
            "-05:00"
        );

        std::env::set_var(TZ_ENV, "+09:00");
        assert_eq!(config.resolve_zone(None).unwrap().to_string(), "+09:00");
        assert_eq!(config.resolve_zone(Some("UTC")).unwrap().to_string(), "UTC");
        std::env::remove_var(TZ_ENV);

        assert_eq!(
            BiblioConfig::default().resolve_zone(None).unwrap(),
            ReferenceZone::utc()
        );
    }

    #[test]
    #[serial]
    fn test_zone_invalid() {
        std::env::remove_var(TZ_ENV);
        assert!(BiblioConfig::default()
            .resolve_zone(Some("Mars/Olympus"))
            .is_err());
    }

    #[test]
    #[serial]
    fn test_sessions_path_priority() {
        std::env::remove_var(SESSIONS_ENV);
        let config = parse("sessions_path = \"from-config.json\"");
        assert_eq!(
            config.resolve_sessions_path(None).unwrap(),
            PathBuf::from("from-config.json")
        );

        std::env::set_var(SESSIONS_ENV, "from-env.csv");
        assert_eq!(
            config.resolve_sessions_path(None).unwrap(),
            PathBuf::from("from-env.csv")
        );
        assert_eq!(
            config
                .resolve_sessions_path(Some(PathBuf::from("flag.db")))
                .unwrap(),
            PathBuf::from("flag.db")
        );
        std::env::remove_var(SESSIONS_ENV);

        assert!(BiblioConfig::default().resolve_sessions_path(None).is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_config_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "time_zone = \"-03:00\"\n").unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        let config = BiblioConfig::load();
        std::env::set_var(CONFIG_ENV, dir.path().join("missing.toml"));
        let fallback = BiblioConfig::load();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(config.time_zone.as_deref(), Some("-03:00"));
        assert!(fallback.time_zone.is_none());
    }
}
