//! Checker configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use regchem_core::{RegchemError, Result};

use crate::database::LawSource;

/// Configuration for building a [`Checker`](crate::Checker).
///
/// ```
/// use regchem_law::CheckerConfig;
///
/// let config: CheckerConfig = serde_json::from_str(r#"{"match_budget_ms": 250}"#).unwrap();
/// assert_eq!(config.law_sources.len(), 3);
/// assert_eq!(config.match_budget().unwrap().as_millis(), 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Law tables, loaded in order.
    pub law_sources: Vec<LawSource>,
    /// Wall-clock budget for matching in one `check` call, in milliseconds.
    pub match_budget_ms: Option<u64>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            law_sources: vec![
                LawSource::new("laws/law1.json", "Narcotics and Psychotropics Control Act"),
                LawSource::new("laws/law2.json", "Stimulants Control Act"),
                LawSource::new("laws/law3.json", "Poisonous and Deleterious Substances Control Act"),
            ],
            match_budget_ms: None,
        }
    }
}

impl CheckerConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject a zero match budget, which would skip every pattern.
    pub fn validate(&self) -> Result<()> {
        if self.match_budget_ms == Some(0) {
            return Err(RegchemError::InvalidInput("match_budget_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn with_sources(law_sources: Vec<LawSource>) -> Self {
        Self { law_sources, ..Self::default() }
    }

    pub fn match_budget(&self) -> Option<Duration> {
        self.match_budget_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lists_three_laws() {
        let config = CheckerConfig::default();
        let names: Vec<&str> = config.law_sources.iter().map(|s| s.law_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Narcotics and Psychotropics Control Act",
                "Stimulants Control Act",
                "Poisonous and Deleterious Substances Control Act",
            ]
        );
        assert_eq!(config.law_sources[1].path, Path::new("laws/law2.json"));
        assert!(config.match_budget().is_none());
    }

    #[test]
    fn from_json_file_overrides_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regchem.json");
        std::fs::write(
            &path,
            r#"{"law_sources": [{"path": "tables/custom.json", "law_name": "Custom Act"}]}"#,
        )
        .unwrap();
        let config = CheckerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.law_sources, vec![LawSource::new("tables/custom.json", "Custom Act")]);
        assert_eq!(config.match_budget_ms, None);
    }

    #[test]
    fn from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CheckerConfig::from_json_file(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, RegchemError::Io(_)));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"match_budget_ms": "soon"}"#).unwrap();
        let err = CheckerConfig::from_json_file(&bad).unwrap_err();
        assert!(matches!(err, RegchemError::Json(_)));

        std::fs::write(&bad, r#"{"match_budget_ms": 0}"#).unwrap();
        let err = CheckerConfig::from_json_file(&bad).unwrap_err();
        assert!(matches!(err, RegchemError::InvalidInput(_)));
        assert!(err.to_string().contains("match_budget_ms"));
    }
}
