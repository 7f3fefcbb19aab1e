use thiserror::Error;

/// Failures surfaced to callers. Unknown entities are deliberately absent:
/// they resolve through the fallback hierarchy and only lower the confidence
/// grade of the assembled vector.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("missing required field `{0}` in prediction request")]
    MissingRequiredField(&'static str),

    #[error("historical corpus is empty; cannot derive training features")]
    EmptyCorpus,

    #[error("feature schema mismatch: model expects {expected:?}, assembler produces {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}
