use crate::domain::scoring::weights::LearnedWeights;
use anyhow::{Context, Result};
use std::path::Path;

/// Loads learned weights from a `.json` file, or TOML for any other extension.
pub fn load_learned_weights(path: impl AsRef<Path>) -> Result<LearnedWeights> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read weights file: {}", path.display()))?;
    parse_learned_weights(&content, is_json(path))
        .context(format!("Failed to parse weights file: {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn parse_learned_weights(content: &str, json: bool) -> Result<LearnedWeights> {
    let weights: LearnedWeights = if json {
        serde_json::from_str(content).context("Invalid weights JSON")?
    } else {
        toml::from_str(content).context("Invalid weights TOML")?
    };
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::timeframe::Timeframe;

    #[test]
    fn test_parse_toml_weights() {
        let content = r#"
            [htf]
            W = 1.2
            "4h" = 0.8

            [signals]
            supertrend = 1.5
        "#;
        let weights = parse_learned_weights(content, false).unwrap();
        assert_eq!(weights.htf_multiplier(Timeframe::OneWeek), 1.2);
        assert_eq!(weights.htf_multiplier(Timeframe::FourHour), 0.8);
        assert_eq!(weights.htf_multiplier(Timeframe::OneDay), 1.0);
        assert_eq!(weights.signals.supertrend, 1.5);
        assert_eq!(weights.signals.rsi, 1.0);
    }

    #[test]
    fn test_parse_json_weights() {
        let content = r#"{"ltf": {"30": 2.0, "5": -1.0}, "consensus": {"D": 3.0}}"#;
        let weights = parse_learned_weights(content, true).unwrap();
        assert_eq!(weights.ltf_multiplier(Timeframe::ThirtyMin), 2.0);
        // non-positive reads as neutral
        assert_eq!(weights.ltf_multiplier(Timeframe::FiveMin), 1.0);
        assert_eq!(weights.consensus_weight(Timeframe::OneDay), 3.0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_learned_weights("/nonexistent/weights.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/weights.toml"));
    }

    #[test]
    fn test_json_extension_detection() {
        assert!(is_json(Path::new("w.JSON")));
        assert!(!is_json(Path::new("w.toml")));
    }
}
