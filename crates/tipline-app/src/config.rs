//! Persisted application state: lookup credentials, investigator identity,
//! and the recent-files list.
//!
//! Everything lives as small JSON files under the platform config
//! directory. Load failures are warnings, never fatal; a missing file
//! yields defaults.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tipline_core::error::PersistError;

pub const RECENT_FILES_CAP: usize = 5;

/// Config directory, created on demand.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tipline");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tipline");
    }
    PathBuf::from(".")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaxMindCredentials {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub license_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArinCredentials {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvestigatorInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
}

impl InvestigatorInfo {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.title.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RecentFiles {
    pub paths: Vec<String>,
}

impl RecentFiles {
    /// Promote a path to the front, keeping at most five entries.
    pub fn record(&mut self, path: &str) {
        self.paths.retain(|p| p != path);
        self.paths.insert(0, path.to_string());
        self.paths.truncate(RECENT_FILES_CAP);
    }
}

pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, PersistError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| PersistError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let raw = serde_json::to_string_pretty(value).map_err(|source| PersistError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, raw).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// File names within the config directory.
pub const MAXMIND_FILE: &str = "maxmind_credentials.json";
pub const ARIN_FILE: &str = "arin_credentials.json";
pub const INVESTIGATOR_FILE: &str = "investigator_info.json";
pub const STATEMENTS_FILE: &str = "custom_statements.json";
pub const RECENT_FILES_FILE: &str = "recent_files.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: MaxMindCredentials = load_json(&dir.path().join("nope.json")).unwrap();
        assert_eq!(loaded, MaxMindCredentials::default());
    }

    #[test]
    fn credentials_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join(MAXMIND_FILE);
        let creds = MaxMindCredentials {
            account_id: "12345".to_string(),
            license_key: "abcdef".to_string(),
        };
        save_json(&path, &creds).unwrap();
        let loaded: MaxMindCredentials = load_json(&path).unwrap();
        assert_eq!(loaded, creds);
    }

    #[test]
    fn malformed_files_surface_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ARIN_FILE);
        std::fs::write(&path, "not json").unwrap();
        let result: Result<ArinCredentials, _> = load_json(&path);
        assert!(matches!(result, Err(PersistError::Malformed { .. })));
    }

    #[test]
    fn recent_files_dedupe_and_cap() {
        let mut recent = RecentFiles::default();
        for i in 0..7 {
            recent.record(&format!("/reports/{i}.json"));
        }
        recent.record("/reports/4.json");
        assert_eq!(recent.paths.len(), RECENT_FILES_CAP);
        assert_eq!(recent.paths[0], "/reports/4.json");
        assert_eq!(recent.paths[1], "/reports/6.json");
    }
}
