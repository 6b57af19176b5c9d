//! Configuration management for the risk dashboard

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How zero-valued clinical measurements are treated at assembly time
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Accept zeros as submitted (the form's own minimum is zero)
    #[default]
    PassThrough,
    /// Reject zero glucose, blood pressure, skin thickness, insulin or BMI
    Reject,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub assets: AssetsConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:8501"
    pub bind: String,
}

/// Paths of the fitted artifacts produced by the offline training job
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Serialized scaler (.json)
    pub scaler_path: PathBuf,
    /// Serialized classifier (.json, or .onnx with the `onnx` feature)
    pub model_path: PathBuf,
    /// Reference dataset CSV used for exploratory statistics
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

/// Display-only assets
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding every display asset
    pub dir: PathBuf,
    /// Precomputed cluster visualization image
    #[serde(default = "default_cluster_image")]
    pub cluster_image: String,
    /// Precomputed cluster summary table (CSV)
    #[serde(default = "default_cluster_summary")]
    pub cluster_summary: String,
    /// Model evaluation report (plain text)
    #[serde(default = "default_evaluation_report")]
    pub evaluation_report: String,
    /// Exploratory analysis chart images, shown in order
    #[serde(default)]
    pub eda_charts: Vec<String>,
}

fn default_cluster_image() -> String {
    "clusters.png".to_string()
}

fn default_cluster_summary() -> String {
    "cluster_summary.csv".to_string()
}

fn default_evaluation_report() -> String {
    "classification_report.txt".to_string()
}

impl AssetsConfig {
    /// Resolve an asset file name against the asset directory
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Input validation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub zero_policy: ZeroPolicy,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Interval between logged metric summaries (0 disables the reporter)
    pub report_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8501".to_string(),
            },
            artifacts: ArtifactsConfig {
                scaler_path: PathBuf::from("fixtures/scaler.json"),
                model_path: PathBuf::from("fixtures/model.json"),
                dataset_path: Some(PathBuf::from("fixtures/diabetes.csv")),
            },
            assets: AssetsConfig {
                dir: PathBuf::from("fixtures/assets"),
                cluster_image: default_cluster_image(),
                cluster_summary: default_cluster_summary(),
                evaluation_report: default_evaluation_report(),
                eda_charts: vec!["outcome_distribution.png".to_string()],
            },
            validation: ValidationConfig::default(),
            metrics: MetricsConfig {
                report_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.validation.zero_policy, ZeroPolicy::PassThrough);
        assert_eq!(config.assets.eda_charts, ["outcome_distribution.png"]);
        assert_eq!(
            config.assets.path_of("clusters.png"),
            PathBuf::from("fixtures/assets/clusters.png")
        );
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"

[artifacts]
scaler_path = "a/scaler.json"
model_path = "a/model.json"

[assets]
dir = "assets"

[validation]
zero_policy = "reject"

[metrics]
report_interval_secs = 0

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.artifacts.dataset_path, None);
        assert_eq!(config.assets.cluster_image, "clusters.png");
        assert!(config.assets.eda_charts.is_empty());
        assert_eq!(config.validation.zero_policy, ZeroPolicy::Reject);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.artifacts.model_path, PathBuf::from("fixtures/model.json"));
        assert_eq!(config.validation.zero_policy, ZeroPolicy::PassThrough);

        // Every configured display asset ships with the fixtures
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let assets = &config.assets;
        let fixed = [
            &assets.cluster_image,
            &assets.cluster_summary,
            &assets.evaluation_report,
        ];
        for name in assets.eda_charts.iter().chain(fixed) {
            assert!(root.join(assets.path_of(name)).is_file(), "{name} missing");
        }
    }
}
