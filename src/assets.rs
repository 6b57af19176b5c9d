//! Display-only assets: cluster results, charts and the evaluation report.
//!
//! Nothing here feeds the inference path. A missing asset only degrades the
//! panel that shows it.

use crate::config::AssetsConfig;
use crate::error::SupportingAssetMissing;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One row of the precomputed cluster summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    #[serde(rename = "Cluster")]
    pub cluster: i64,
    /// Share of diabetic patients in the cluster (0.0 - 1.0)
    #[serde(rename = "Proporcao_Diabetes")]
    pub diabetes_rate: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Insulin")]
    pub insulin: f64,
}

/// Assets read once at startup, each slot independent of the others
#[derive(Debug, Clone)]
pub struct SupportingAssets {
    dir: PathBuf,
    cluster_image: String,
    eda_charts: Vec<String>,
    pub cluster_summary: Result<Vec<ClusterProfile>, SupportingAssetMissing>,
    pub evaluation_report: Result<String, SupportingAssetMissing>,
}

impl SupportingAssets {
    pub fn load(config: &AssetsConfig) -> Self {
        let cluster_summary = load_cluster_summary(&config.path_of(&config.cluster_summary));
        let evaluation_report = load_report(&config.path_of(&config.evaluation_report));

        for missing in [cluster_summary.as_ref().err(), evaluation_report.as_ref().err()]
            .into_iter()
            .flatten()
        {
            warn!(error = %missing, "Supporting asset unavailable");
        }
        info!(
            dir = %config.dir.display(),
            cluster_summary = cluster_summary.is_ok(),
            evaluation_report = evaluation_report.is_ok(),
            "Supporting assets loaded"
        );

        Self {
            dir: config.dir.clone(),
            cluster_image: config.cluster_image.clone(),
            eda_charts: config.eda_charts.clone(),
            cluster_summary,
            evaluation_report,
        }
    }

    /// Cluster visualization file name, if present on disk
    pub fn cluster_image(&self) -> Result<&str, SupportingAssetMissing> {
        self.image(&self.cluster_image)
    }

    /// Every configured chart with its availability, in configured order
    pub fn eda_charts(&self) -> Vec<Result<&str, SupportingAssetMissing>> {
        self.eda_charts.iter().map(|name| self.image(name)).collect()
    }

    /// Resolve a request for an asset by plain file name.
    ///
    /// Names containing path separators or parent references are refused.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }
        Some(self.dir.join(name))
    }

    fn image<'a>(&self, name: &'a str) -> Result<&'a str, SupportingAssetMissing> {
        let path = self.dir.join(name);
        if path.is_file() {
            Ok(name)
        } else {
            Err(SupportingAssetMissing {
                path,
                reason: "file not found".to_string(),
            })
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

fn load_cluster_summary(path: &Path) -> Result<Vec<ClusterProfile>, SupportingAssetMissing> {
    let missing = |reason: String| SupportingAssetMissing {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| missing(e.to_string()))?;
    let mut rows: Vec<ClusterProfile> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|e| missing(e.to_string()))?;
    rows.sort_by_key(|r| r.cluster);
    Ok(rows)
}

fn load_report(path: &Path) -> Result<String, SupportingAssetMissing> {
    std::fs::read_to_string(path).map_err(|e| SupportingAssetMissing {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> AssetsConfig {
        AssetsConfig {
            dir: dir.to_path_buf(),
            cluster_image: "clusters.png".to_string(),
            cluster_summary: "cluster_summary.csv".to_string(),
            evaluation_report: "classification_report.txt".to_string(),
            eda_charts: vec!["present.png".to_string(), "absent.png".to_string()],
        }
    }

    #[test]
    fn test_each_asset_degrades_independently() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cluster_summary.csv"),
            "Cluster,Proporcao_Diabetes,Glucose,BMI,Age,Insulin,Extra\n1,0.6,150,35,36,140,x\n0,0.2,105,30,27,62,y\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("present.png"), b"png").unwrap();

        let assets = SupportingAssets::load(&config(dir.path()));

        let clusters = assets.cluster_summary.as_ref().unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cluster, 0);
        assert_eq!(clusters[1].diabetes_rate, 0.6);

        assert!(assets.evaluation_report.is_err());
        assert!(assets.cluster_image().is_err());

        let charts = assets.eda_charts();
        assert_eq!(charts[0].as_ref().ok(), Some(&"present.png"));
        assert!(charts[1].is_err());
    }

    #[test]
    fn test_resolve_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let assets = SupportingAssets::load(&config(dir.path()));

        assert!(assets.resolve("clusters.png").is_some());
        assert!(assets.resolve("../config.toml").is_none());
        assert!(assets.resolve("sub/file.png").is_none());
        assert!(assets.resolve("..").is_none());
        assert!(assets.resolve(".hidden").is_none());
        assert!(assets.resolve("").is_none());
    }
}
