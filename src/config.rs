use crate::milestones::{Milestone, is_strictly_ascending};
use crate::stats::StatsOptions;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "albumlog";
const SETTINGS_FILE: &str = "settings.json";
const COLLECTION_FILE: &str = "collection.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// User whose collection is opened when no `--user` is given.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub stats: StatsOptions,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let ladders = &self.stats.milestones;
        ensure_ladder("listens", &ladders.listens)?;
        ensure_ladder("artists", &ladders.artists)?;
        ensure_ladder("discovered", &ladders.discovered)?;
        Ok(())
    }
}

fn ensure_ladder(name: &str, ladder: &[Milestone]) -> Result<()> {
    ensure!(
        is_strictly_ascending(ladder),
        "{name} milestones must be strictly ascending by level"
    );
    Ok(())
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("ALBUMLOG_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn collection_path() -> Result<PathBuf> {
    Ok(config_root()?.join(COLLECTION_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    settings.validate()?;
    ensure_config_dir()?;
    let path = settings_path()?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestones::BadgeTier;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "userId": "uid" }"#).expect("parse");
        assert_eq!(settings.user_id.as_deref(), Some("uid"));
        assert_eq!(settings.stats, StatsOptions::default());
        assert_eq!(settings.stats.recent_limit, 15);
    }

    #[test]
    fn descending_ladder_is_rejected() {
        let mut settings = Settings::default();
        settings.stats.milestones.artists = vec![
            Milestone::new(50, BadgeTier::Silver),
            Milestone::new(10, BadgeTier::Bronze),
        ];
        let err = settings.validate().expect_err("descending");
        assert!(err.to_string().contains("artists"));
    }

    // Both cases share one test: the override variable is process-wide.
    #[test]
    fn settings_round_trip_and_validation_on_load() {
        let dir = tempdir().expect("tempdir");
        unsafe {
            env::set_var("ALBUMLOG_CONFIG_DIR", dir.path().to_string_lossy().as_ref());
        }

        assert_eq!(load_settings().expect("defaults"), Settings::default());

        let mut settings = Settings {
            user_id: Some(String::from("uid")),
            ..Settings::default()
        };
        settings.stats.recent_limit = 5;
        save_settings(&settings).expect("save");
        assert_eq!(load_settings().expect("load"), settings);
        assert_eq!(collection_path().expect("path"), dir.path().join("collection.json"));

        fs::write(
            dir.path().join("settings.json"),
            r#"{ "stats": { "milestones": { "listens": [
                { "level": 100, "tier": "gold" }, { "level": 10, "tier": "bronze" }
            ] } } }"#,
        )
        .expect("write");
        let err = load_settings().expect_err("invalid ladder");
        assert!(format!("{err:#}").contains("listens milestones must be strictly ascending"));
    }
}
