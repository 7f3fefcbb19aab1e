use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crickform::artifact::ModelArtifact;
use crickform::corpus::Corpus;
use crickform::encoder::CategoricalEncoder;
use crickform::features;
use crickform::store;

const DEFAULT_DB: &str = "crickform.sqlite";
const DEFAULT_OUT_DIR: &str = "artifacts";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_flag("--db")
        .or_else(|| std::env::var("CRICKFORM_DB").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
    let out_dir = parse_flag("--out")
        .or_else(|| std::env::var("CRICKFORM_OUT").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

    let conn = store::open_db(&db_path)?;
    let rows = store::load_innings(&conn)?;
    if rows.is_empty() {
        return Err(anyhow!(
            "no innings found in {} (run an ingest first)",
            db_path.display()
        ));
    }
    info!(rows = rows.len(), db = %db_path.display(), "loaded innings snapshot");

    let corpus = Corpus::new(rows);
    let encoder = CategoricalEncoder::fit(&corpus);
    let table = features::build_feature_table(&corpus, &encoder)
        .map_err(|e| anyhow!("feature assembly failed: {e}"))?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir {}", out_dir.display()))?;

    let features_path = out_dir.join("features.json");
    let json = serde_json::to_string(&table).context("serialize feature table")?;
    std::fs::write(&features_path, json)
        .with_context(|| format!("write feature table {}", features_path.display()))?;

    let artifact = ModelArtifact::build(
        &corpus,
        encoder,
        Some(db_path.display().to_string()),
    );
    let artifact_path = out_dir.join("artifact.json");
    artifact.save(&artifact_path)?;

    info!(
        rows = table.len(),
        players = corpus.players().len(),
        venues = corpus.venues().len(),
        features = %features_path.display(),
        artifact = %artifact_path.display(),
        "feature build complete"
    );
    Ok(())
}

fn parse_flag(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if arg == name {
            return args.get(idx + 1).cloned();
        }
        if let Some(rest) = arg.strip_prefix(&format!("{name}=")) {
            return Some(rest.to_string());
        }
    }
    None
}
