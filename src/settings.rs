use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};
use std::time::Duration;

use crate::aggregator::DEFAULT_HISTORY_WINDOW;
use crate::vision::Region;

pub const CONFIG_PATH_VAR: &str = "EMOLENS_CONFIG";
const ENDPOINT_VAR: &str = "EMOLENS_ENDPOINT";
pub const FRAMES_DIR_VAR: &str = "EMOLENS_FRAMES_DIR";
const DEBUG_VAR: &str = "EMOLENS_DEBUG";

const DEBUG_RENDER_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    /// Multipart field carrying the face crop.
    pub upload_field: String,
    pub detection_interval_ms: u64,
    pub clock_interval_ms: u64,
    pub render_interval_ms: u64,
    /// Upper bound on one tick from locate through classification.
    pub tick_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub history_window: usize,
    /// Drop results from ticks older than the last one applied.
    pub discard_stale_results: bool,
    pub frames_dir: Option<PathBuf>,
    pub face_region: Option<Region>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict".into(),
            upload_field: "file".into(),
            detection_interval_ms: 1_000,
            clock_interval_ms: 1_000,
            render_interval_ms: 1_000,
            tick_timeout_ms: 10_000,
            request_timeout_ms: 8_000,
            history_window: DEFAULT_HISTORY_WINDOW,
            discard_stale_results: false,
            frames_dir: None,
            face_region: None,
        }
    }
}

impl Settings {
    /// Defaults, overlaid by the JSON file named in `EMOLENS_CONFIG` (if any),
    /// overlaid by the individual environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env_overrides(|key| env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            self.endpoint = endpoint;
        }
        if let Some(dir) = lookup(FRAMES_DIR_VAR) {
            self.frames_dir = Some(PathBuf::from(dir));
        }
        let debug_mode = lookup(DEBUG_VAR)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.render_interval_ms = DEBUG_RENDER_INTERVAL_MS;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("detection_interval_ms", self.detection_interval_ms),
            ("clock_interval_ms", self.clock_interval_ms),
            ("render_interval_ms", self.render_interval_ms),
            ("tick_timeout_ms", self.tick_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        if self.history_window == 0 {
            bail!("history_window must be greater than zero");
        }
        Url::parse(&self.endpoint)
            .with_context(|| format!("endpoint {:?} is not a valid URL", self.endpoint))?;
        Ok(())
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_millis(self.tick_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
