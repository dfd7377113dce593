use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{PathType, Track};
use crate::ingest::loader::{LoadError, SheetSources};
use crate::ingest::normalize::NormalizePolicy;

pub const NODES_URL_ENV: &str = "CAREER_PATH_NODES_CSV_URL";
pub const EDGES_URL_ENV: &str = "CAREER_PATH_EDGES_CSV_URL";

const DEFAULT_NODES_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQmxVYnDbPmy4_vXfPGrnGnhn_y7CL-F2kcxOcbqc-e1Gq2oOaGH4xShCB-si0UCts2oKBGFhpyQ06_/pub?gid=2054925201&single=true&output=csv";
const DEFAULT_EDGES_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQmxVYnDbPmy4_vXfPGrnGnhn_y7CL-F2kcxOcbqc-e1Gq2oOaGH4xShCB-si0UCts2oKBGFhpyQ06_/pub?gid=1460213672&single=true&output=csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // Published CSV endpoints of the two sheets
    #[serde(default = "AppSettings::default_nodes_url")]
    pub nodes_csv_url: String,
    #[serde(default = "AppSettings::default_edges_url")]
    pub edges_csv_url: String,
    #[serde(default = "AppSettings::default_timeout_secs")]
    pub request_timeout_secs: u64,
    // Used when a node row carries an unrecognized track / path type
    #[serde(default)]
    pub default_track: Track,
    #[serde(default)]
    pub default_path_type: PathType,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            nodes_csv_url: Self::default_nodes_url(),
            edges_csv_url: Self::default_edges_url(),
            request_timeout_secs: Self::default_timeout_secs(),
            default_track: Track::default(),
            default_path_type: PathType::default(),
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Career-Path
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Career-Path");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Career-Path
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Career-Path");
            }
            return PathBuf::from("Career-Path");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Career-Path or ~/.config/Career-Path
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Career-Path");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Career-Path");
        }
    }

    /// Read `settings.json` from the per-user config dir, then apply
    /// environment overrides. A missing file means defaults.
    pub fn load() -> anyhow::Result<Self> {
        let json_path = Self::config_dir().join("settings.json");
        let settings = if json_path.exists() {
            let mut f = std::fs::File::open(json_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            Self::from_json(&s)?
        } else {
            Self::default()
        };
        Ok(settings.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Replace the sheet URLs with whatever `lookup` finds for the override
    /// variables. Blank values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(NODES_URL_ENV) {
            self.nodes_csv_url = url;
        }
        if let Some(url) = non_blank(EDGES_URL_ENV) {
            self.edges_csv_url = url;
        }
        self
    }

    pub fn sources(&self) -> Result<SheetSources, LoadError> {
        SheetSources::parse(&self.nodes_csv_url, &self.edges_csv_url)
    }

    pub fn normalize_policy(&self) -> NormalizePolicy {
        NormalizePolicy {
            default_track: self.default_track,
            default_path_type: self.default_path_type,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Return the directory where the settings file (settings.json) is stored.
    /// This is OS-specific and resolves to a per-user configuration directory.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    fn default_nodes_url() -> String { DEFAULT_NODES_CSV_URL.to_string() }
    fn default_edges_url() -> String { DEFAULT_EDGES_CSV_URL.to_string() }
    fn default_timeout_secs() -> u64 { 15 }
}
