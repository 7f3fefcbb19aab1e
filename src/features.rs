use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Dimension, DimensionAggregates, compute_dimension_aggregates};
use crate::corpus::Corpus;
use crate::encoder::{CategoricalEncoder, Category};
use crate::error::FeatureError;
use crate::match_context::{MatchContext, compute_match_context};
use crate::rolling::{RollingForm, compute_rolling_form};

/// The model input contract. Order and count are load-bearing: a fitted model
/// and this schema are versioned together, and any change requires retraining.
pub const FEATURE_NAMES: [&str; 12] = [
    "player_id",
    "team_id",
    "opponent_id",
    "venue_id",
    "runs_last_5_avg",
    "strike_rate_last_5",
    "venue_avg_runs",
    "opponent_avg_runs",
    "is_home_match",
    "batting_position",
    "venue_avg_strike_rate",
    "opponent_avg_strike_rate",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub player_id: f64,
    pub team_id: f64,
    pub opponent_id: f64,
    pub venue_id: f64,
    pub runs_last_5_avg: f64,
    pub strike_rate_last_5: f64,
    pub venue_avg_runs: f64,
    pub opponent_avg_runs: f64,
    pub is_home_match: f64,
    pub batting_position: f64,
    pub venue_avg_strike_rate: f64,
    pub opponent_avg_strike_rate: f64,
}

impl FeatureVector {
    pub const DIM: usize = FEATURE_NAMES.len();

    /// Flattens into FEATURE_NAMES order.
    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.player_id,
            self.team_id,
            self.opponent_id,
            self.venue_id,
            self.runs_last_5_avg,
            self.strike_rate_last_5,
            self.venue_avg_runs,
            self.opponent_avg_runs,
            self.is_home_match,
            self.batting_position,
            self.venue_avg_strike_rate,
            self.opponent_avg_strike_rate,
        ]
    }
}

/// One training row: the fixed-schema vector plus the regression target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub features: FeatureVector,
    pub target_runs: f64,
}

/// Every derived column the pipeline produces, aligned with corpus record
/// indices. The fixed FeatureVector schema is a projection of this; the wider
/// table (10-match windows, player x dimension expanding means, rest days,
/// season index) stays available for model experiments and the query layer.
#[derive(Debug)]
pub struct DerivedTable {
    pub rolling: RollingForm,
    pub venue: DimensionAggregates,
    pub opponent: DimensionAggregates,
    pub context: MatchContext,
}

/// Runs every derivation over the immutable corpus. None of them depend on
/// another's output, but each dimension's pass 1 completes before its pass 2
/// inside `compute_dimension_aggregates`.
pub fn derive_all(corpus: &Corpus) -> Result<DerivedTable, FeatureError> {
    if corpus.is_empty() {
        return Err(FeatureError::EmptyCorpus);
    }
    let rolling = compute_rolling_form(corpus);
    let venue = compute_dimension_aggregates(corpus, Dimension::Venue);
    let opponent = compute_dimension_aggregates(corpus, Dimension::Opponent);
    let context = compute_match_context(corpus);
    debug!(records = corpus.len(), "derived feature columns");
    Ok(DerivedTable {
        rolling,
        venue,
        opponent,
        context,
    })
}

/// Batch feature assembly: one row per historical record in the fixed schema,
/// targets attached, non-finite values filled with 0 before hand-off to model
/// fitting.
pub fn build_feature_table(
    corpus: &Corpus,
    encoder: &CategoricalEncoder,
) -> Result<Vec<FeatureRow>, FeatureError> {
    let derived = derive_all(corpus)?;
    let rows = corpus
        .records()
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            let form = derived.rolling.stats(5, idx);
            FeatureRow {
                features: FeatureVector {
                    player_id: encoder.encode(Category::Player, &r.player).id as f64,
                    team_id: encoder.encode(Category::Team, &r.team).id as f64,
                    opponent_id: encoder.encode(Category::Opponent, &r.opponent).id as f64,
                    venue_id: encoder.encode(Category::Venue, &r.venue).id as f64,
                    runs_last_5_avg: fill_zero(form.runs_avg),
                    strike_rate_last_5: fill_zero(form.strike_rate_avg),
                    venue_avg_runs: fill_zero(derived.venue.avg_runs[idx]),
                    opponent_avg_runs: fill_zero(derived.opponent.avg_runs[idx]),
                    is_home_match: derived.context.is_home[idx],
                    batting_position: derived.context.batting_position[idx],
                    venue_avg_strike_rate: fill_zero(derived.venue.avg_strike_rate[idx]),
                    opponent_avg_strike_rate: fill_zero(derived.opponent.avg_strike_rate[idx]),
                },
                target_runs: r.runs_scored as f64,
            }
        })
        .collect();
    Ok(rows)
}

/// Refuses to serve a model whose persisted feature schema disagrees with the
/// assembler's output, rather than silently miscomputing.
pub fn validate_schema(expected: &[String]) -> Result<(), FeatureError> {
    if expected.len() != FEATURE_NAMES.len()
        || expected.iter().zip(FEATURE_NAMES).any(|(e, n)| e != n)
    {
        return Err(FeatureError::SchemaMismatch {
            expected: expected.to_vec(),
            found: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

fn fill_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::test_support::record;

    #[test]
    fn empty_corpus_is_fatal_for_batch_assembly() {
        let corpus = Corpus::new(Vec::new());
        let encoder = CategoricalEncoder::default();
        assert!(matches!(
            build_feature_table(&corpus, &encoder),
            Err(FeatureError::EmptyCorpus)
        ));
    }

    #[test]
    fn rows_align_with_records_and_carry_targets() {
        let corpus = Corpus::new(vec![
            record(1, "A", "T", "O", "V", (2023, 4, 1), 10, 10),
            record(2, "A", "T", "O", "V", (2023, 4, 5), 50, 25),
        ]);
        let encoder = CategoricalEncoder::fit(&corpus);
        let rows = build_feature_table(&corpus, &encoder).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].target_runs, 10.0);
        // Cold start on the first record, shifted mean on the second.
        assert_eq!(rows[0].features.runs_last_5_avg, 0.0);
        assert!((rows[1].features.runs_last_5_avg - 10.0).abs() < 1e-9);
    }

    #[test]
    fn schema_validation_rejects_reordered_columns() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        assert!(validate_schema(&names).is_ok());
        names.swap(4, 5);
        assert!(matches!(
            validate_schema(&names),
            Err(FeatureError::SchemaMismatch { .. })
        ));
        names.swap(4, 5);
        names.pop();
        assert!(matches!(
            validate_schema(&names),
            Err(FeatureError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn vector_flattens_in_schema_order() {
        let corpus = Corpus::new(vec![record(1, "A", "T", "O", "V", (2023, 4, 1), 10, 10)]);
        let encoder = CategoricalEncoder::fit(&corpus);
        let rows = build_feature_table(&corpus, &encoder).unwrap();
        let arr = rows[0].features.to_array();
        assert_eq!(arr.len(), FeatureVector::DIM);
        assert_eq!(arr[8], rows[0].features.is_home_match);
        assert_eq!(arr[11], rows[0].features.opponent_avg_strike_rate);
    }
}
