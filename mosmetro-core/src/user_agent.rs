//! Random browser User-Agent selection
//!
//! Portals sometimes treat non-browser clients differently, so the session
//! can present a random real browser identity. The data file is optional:
//! without it the session keeps the HTTP client's default agent.

use crate::error::ConfigError;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Accepted layouts of the User-Agent data file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserAgentData {
    /// `{"browsers": {"chrome": ["..."], "firefox": ["..."]}}`
    Browsers {
        browsers: BTreeMap<String, Vec<String>>,
    },
    /// `["...", "..."]`
    List(Vec<String>),
}

/// Pool of browser User-Agent strings to pick from
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Build a pool from explicit entries; blank entries are dropped
    pub fn new(agents: Vec<String>) -> Self {
        let agents = agents
            .into_iter()
            .map(|agent| agent.trim().to_string())
            .filter(|agent| !agent.is_empty())
            .collect();
        Self { agents }
    }

    /// Load the pool from a JSON data file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data_error = |message: String| ConfigError::UserAgentData {
            path: path.display().to_string(),
            message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| data_error(e.to_string()))?;
        let data: UserAgentData =
            serde_json::from_str(&contents).map_err(|e| data_error(e.to_string()))?;

        let agents = match data {
            UserAgentData::Browsers { browsers } => browsers.into_values().flatten().collect(),
            UserAgentData::List(agents) => agents,
        };

        let pool = Self::new(agents);
        if pool.is_empty() {
            return Err(data_error("no User-Agent entries found".to_string()));
        }

        debug!(path = %path.display(), entries = pool.len(), "Loaded User-Agent data");
        Ok(pool)
    }

    /// Pick a random entry
    pub fn random(&self) -> Option<&str> {
        self.agents.choose(&mut rand::rng()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Resolve the User-Agent for this run
///
/// Returns `None` (with a warning) when no data file is configured or it
/// cannot be used. The caller then leaves the client default in place.
pub fn pick_user_agent(path: Option<&Path>) -> Option<String> {
    let Some(path) = path else {
        warn!("Random User-Agent disabled: no User-Agent data file configured");
        return None;
    };

    match UserAgentPool::from_file(path) {
        Ok(pool) => pool.random().map(str::to_string),
        Err(e) => {
            warn!("Random User-Agent disabled: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_data(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_browsers_layout() {
        let file = write_data(
            r#"{"browsers": {"chrome": ["Chrome/1"], "firefox": ["Firefox/2", "Firefox/3"]}, "randomize": {"0": "chrome"}}"#,
        );
        let pool = UserAgentPool::from_file(file.path()).unwrap();
        assert_eq!(pool.len(), 3);

        let agent = pool.random().unwrap();
        assert!(["Chrome/1", "Firefox/2", "Firefox/3"].contains(&agent));
    }

    #[test]
    fn test_load_list_layout() {
        let file = write_data(r#"["Agent/1", "  ", "Agent/2"]"#);
        let pool = UserAgentPool::from_file(file.path()).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_empty_data_is_rejected() {
        let file = write_data(r#"{"browsers": {}}"#);
        let result = UserAgentPool::from_file(file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("no User-Agent entries"));
    }

    #[test]
    fn test_bundled_data_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../res/user-agent.json");
        let pool = UserAgentPool::from_file(&path).unwrap();
        assert!(pool.len() > 1);
        assert!(pool.random().unwrap().starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_missing_data_degrades_to_none() {
        assert!(pick_user_agent(None).is_none());
        assert!(pick_user_agent(Some(Path::new("/nonexistent/user-agent.json"))).is_none());
    }

    #[test]
    fn test_malformed_data_degrades_to_none() {
        let file = write_data("{ not json");
        assert!(pick_user_agent(Some(file.path())).is_none());
    }
}
