use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::encoder::CategoricalEncoder;
use crate::error::FeatureError;
use crate::features::FEATURE_NAMES;

pub const ARTIFACT_VERSION: u32 = 1;

/// Everything serving needs to reproduce training-time features: the fitted
/// encoder, the column schema it was fitted against, and enough snapshot
/// summary stats to sanity-check a reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub source: Option<String>,
    pub feature_names: Vec<String>,
    pub encoder: CategoricalEncoder,
    pub corpus_records: usize,
    #[serde(default)]
    pub corpus_mean_runs: Option<f64>,
    #[serde(default)]
    pub corpus_mean_strike_rate: Option<f64>,
}

impl ModelArtifact {
    pub fn build(corpus: &Corpus, encoder: CategoricalEncoder, source: Option<String>) -> Self {
        ModelArtifact {
            version: ARTIFACT_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            source,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            encoder,
            corpus_records: corpus.len(),
            corpus_mean_runs: corpus.mean_runs(),
            corpus_mean_strike_rate: corpus.mean_strike_rate(),
        }
    }

    /// A loaded artifact is only usable if its schema matches the assembler
    /// compiled into this binary.
    pub fn validate(&self) -> Result<(), FeatureError> {
        crate::features::validate_schema(&self.feature_names)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let json = serde_json::to_string_pretty(self).context("serialize model artifact")?;
        std::fs::write(path, json)
            .with_context(|| format!("write model artifact {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read model artifact {}", path.display()))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).context("parse model artifact json")?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(anyhow!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            ));
        }
        artifact
            .validate()
            .map_err(|e| anyhow!("artifact schema mismatch: {e}"))?;
        Ok(artifact)
    }
}
