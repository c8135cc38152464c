use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use url::Url;

use crate::detect::DEFAULT_SCORE_THRESHOLD;
use crate::pipeline::{DisplaySize, ReadStrategy};
use crate::remote::DEFAULT_TIMEOUT_SECS;

const DEFAULT_DETECTOR_MODEL: &str = "models/clock_detector.onnx";
const DEFAULT_HANDS_MODEL: &str = "models/watch_hands.onnx";
const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize, Default)]
struct DialConfigFile {
    detector_model: Option<String>,
    hands_model: Option<String>,
    strategy: Option<String>,
    score_threshold: Option<f32>,
    display: Option<DisplayConfigFile>,
    remote: Option<RemoteConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RemoteConfigFile {
    url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// Remote-reader settings. The API key is only ever taken from the
/// environment (`DIALREAD_REMOTE_API_KEY`), never from the config file.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Runtime configuration for the pipeline.
///
/// Layered the usual way: optional JSON file addressed by `DIALREAD_CONFIG`,
/// then environment overrides, then validation. Model identifiers are
/// configuration, not protocol: their absence fails at startup, not per
/// frame.
#[derive(Debug, Clone)]
pub struct DialConfig {
    /// Watch-face detector model path (`stub://` selects the stub backend).
    pub detector_model: String,
    /// Watch-hands landmark model path.
    pub hands_model: String,
    pub strategy: ReadStrategy,
    pub score_threshold: f32,
    /// Display surface for overlay projection, when a Presenter has one.
    pub display: Option<DisplaySize>,
    pub remote: RemoteSettings,
}

impl DialConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DIALREAD_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DialConfigFile) -> Result<Self> {
        let detector_model = file
            .detector_model
            .unwrap_or_else(|| DEFAULT_DETECTOR_MODEL.to_string());
        let hands_model = file
            .hands_model
            .unwrap_or_else(|| DEFAULT_HANDS_MODEL.to_string());
        let strategy = match file.strategy.as_deref() {
            Some(value) => ReadStrategy::parse(value)?,
            None => ReadStrategy::Local,
        };
        let score_threshold = file.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD);
        let display = match file.display {
            Some(DisplayConfigFile {
                width: Some(width),
                height: Some(height),
            }) => Some(DisplaySize { width, height }),
            Some(_) => {
                return Err(anyhow!(
                    "display config requires both width and height"
                ))
            }
            None => None,
        };
        let remote = RemoteSettings {
            url: file.remote.as_ref().and_then(|remote| remote.url.clone()),
            model: file
                .remote
                .as_ref()
                .and_then(|remote| remote.model.clone())
                .unwrap_or_else(|| DEFAULT_REMOTE_MODEL.to_string()),
            api_key: None,
            timeout: Duration::from_secs(
                file.remote
                    .and_then(|remote| remote.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };
        Ok(Self {
            detector_model,
            hands_model,
            strategy,
            score_threshold,
            display,
            remote,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("DIALREAD_DETECTOR_MODEL") {
            if !path.trim().is_empty() {
                self.detector_model = path;
            }
        }
        if let Ok(path) = std::env::var("DIALREAD_HANDS_MODEL") {
            if !path.trim().is_empty() {
                self.hands_model = path;
            }
        }
        if let Ok(strategy) = std::env::var("DIALREAD_STRATEGY") {
            if !strategy.trim().is_empty() {
                self.strategy = ReadStrategy::parse(strategy.trim())?;
            }
        }
        if let Ok(threshold) = std::env::var("DIALREAD_SCORE_THRESHOLD") {
            if !threshold.trim().is_empty() {
                self.score_threshold = threshold
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("DIALREAD_SCORE_THRESHOLD must be a number"))?;
            }
        }
        if let Ok(url) = std::env::var("DIALREAD_REMOTE_URL") {
            if !url.trim().is_empty() {
                self.remote.url = Some(url);
            }
        }
        if let Ok(model) = std::env::var("DIALREAD_REMOTE_MODEL") {
            if !model.trim().is_empty() {
                self.remote.model = model;
            }
        }
        if let Ok(key) = std::env::var("DIALREAD_REMOTE_API_KEY") {
            if !key.trim().is_empty() {
                self.remote.api_key = Some(key);
            }
        }
        if let Ok(timeout) = std::env::var("DIALREAD_REMOTE_TIMEOUT_SECS") {
            if !timeout.trim().is_empty() {
                let seconds: u64 = timeout.trim().parse().map_err(|_| {
                    anyhow!("DIALREAD_REMOTE_TIMEOUT_SECS must be an integer number of seconds")
                })?;
                self.remote.timeout = Duration::from_secs(seconds);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.score_threshold > 0.0 && self.score_threshold <= 1.0) {
            return Err(anyhow!(
                "score_threshold {} must be in (0, 1]",
                self.score_threshold
            ));
        }
        if self.remote.timeout.as_secs() == 0 {
            return Err(anyhow!("remote timeout must be greater than zero"));
        }
        if let Some(display) = &self.display {
            if display.width == 0 || display.height == 0 {
                return Err(anyhow!("display dimensions must be non-zero"));
            }
        }
        if self.strategy.uses_remote() {
            let url = self.remote.url.as_deref().ok_or_else(|| {
                anyhow!(
                    "strategy '{}' requires remote.url (or DIALREAD_REMOTE_URL)",
                    self.strategy.as_str()
                )
            })?;
            Url::parse(url).map_err(|e| anyhow!("invalid remote url {}: {}", url, e))?;
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<DialConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> DialConfig {
        DialConfig::from_file(DialConfigFile::default()).unwrap()
    }

    #[test]
    fn defaults_are_local_with_low_threshold() {
        let cfg = base_config();
        assert_eq!(cfg.strategy, ReadStrategy::Local);
        assert_eq!(cfg.score_threshold, DEFAULT_SCORE_THRESHOLD);
        assert_eq!(cfg.detector_model, DEFAULT_DETECTOR_MODEL);
        assert_eq!(cfg.hands_model, DEFAULT_HANDS_MODEL);
        assert!(cfg.display.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn remote_strategy_requires_a_url() {
        let mut cfg = base_config();
        cfg.strategy = ReadStrategy::Remote;
        assert!(cfg.validate().is_err());

        cfg.remote.url = Some("https://example.com/v1/chat/completions".to_string());
        cfg.validate().unwrap();
    }

    #[test]
    fn threshold_bounds_are_enforced() {
        let mut cfg = base_config();
        cfg.score_threshold = 0.0;
        assert!(cfg.validate().is_err());
        cfg.score_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_display_config_is_rejected() {
        let file = DialConfigFile {
            display: Some(DisplayConfigFile {
                width: Some(1080),
                height: None,
            }),
            ..Default::default()
        };
        assert!(DialConfig::from_file(file).is_err());
    }
}
