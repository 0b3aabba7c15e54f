//! Settings for the vouching graph viewer.
//!
//! Read once at startup from the platform config directory. Missing files,
//! unreadable files and missing fields all fall back to the defaults.

use crate::fetch::{FetchConfig, DEFAULT_TRUST_LINE_LIMIT};
use crate::graph::ForceLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str =
    "https://api.studio.thegraph.com/query/78581/union-finance/version/latest";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Data source
    pub endpoint: String,
    pub trust_line_limit: usize,
    /// None = wait as long as the endpoint takes
    pub request_timeout_secs: Option<u64>,

    // Display
    pub font_size: f32,
    pub node_color: String,
    pub edge_color: String,
    pub window_width: f32,
    pub window_height: f32,

    // Physics
    pub physics_enabled: bool,
    pub gravitational_constant: f32,
    pub central_gravity: f32,
    pub spring_length: f32,
    pub stabilization_enabled: bool,
    pub stabilization_iterations: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            trust_line_limit: DEFAULT_TRUST_LINE_LIMIT,
            request_timeout_secs: None,

            font_size: 14.0,
            node_color: "#333333".to_string(),
            edge_color: "#999999".to_string(),
            window_width: 1200.0,
            window_height: 900.0,

            physics_enabled: true,
            gravitational_constant: -2000.0,
            central_gravity: 0.3,
            spring_length: 95.0,
            stabilization_enabled: true,
            stabilization_iterations: 1000,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("vouching-graph");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the config directory, returning defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!(path = %path.display(), "Loaded settings");
                    settings
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse settings file, using defaults");
                    Self::default()
                }
            },
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            limit: self.trust_line_limit,
        }
    }

    /// Physics parameters with the configurable ones applied
    pub fn force_layout(&self) -> ForceLayout {
        ForceLayout {
            enabled: self.physics_enabled,
            gravitational_constant: self.gravitational_constant,
            central_gravity: self.central_gravity,
            spring_length: self.spring_length,
            ..ForceLayout::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_json_gives_defaults() {
        let file = write_settings("{ not json");
        assert_eq!(Settings::load_from(file.path()), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_settings(r#"{ "endpoint": "http://localhost:8000/graphql", "trust_line_limit": 25 }"#);
        let settings = Settings::load_from(file.path());

        assert_eq!(settings.endpoint, "http://localhost:8000/graphql");
        assert_eq!(settings.fetch_config().limit, 25);
        assert_eq!(settings.spring_length, 95.0);
        assert_eq!(settings.request_timeout_secs, None);
    }

    #[test]
    fn defaults_match_reference_component() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.trust_line_limit, 10);
        assert_eq!(settings.stabilization_iterations, 1000);
    }

    #[test]
    fn force_layout_takes_physics_fields() {
        let settings = Settings {
            physics_enabled: false,
            gravitational_constant: -500.0,
            ..Settings::default()
        };
        let layout = settings.force_layout();
        assert!(!layout.enabled);
        assert_eq!(layout.gravitational_constant, -500.0);
        assert_eq!(layout.spring_constant, ForceLayout::default().spring_constant);
    }
}
