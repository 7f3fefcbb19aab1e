use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::Corpus;
use crate::encoder::{CategoricalEncoder, Category};
use crate::error::FeatureError;
use crate::features::FeatureVector;
use crate::match_context::{DEFAULT_BATTING_BUCKET, player_batting_buckets, team_home_venues};
use crate::query::{RecentForm, recent_form};

/// Literal last-resort defaults, used only when the snapshot itself cannot
/// supply a value. Roughly a competent middle-order T20 innings.
pub const DEFAULT_RUNS: f64 = 30.0;
pub const DEFAULT_STRIKE_RATE: f64 = 130.0;
pub const DEFAULT_VENUE_RUNS: f64 = 32.0;

/// Career sample size above which recency stats are considered settled.
const RELIABLE_MATCHES: usize = 10;

/// An incoming scoring request. Entity names are matched against the snapshot
/// case-insensitively; every `Option` field is a caller override that beats
/// anything the snapshot would compute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub player: String,
    pub team: String,
    pub opponent: String,
    pub venue: String,
    #[serde(default)]
    pub runs_last_5_avg: Option<f64>,
    #[serde(default)]
    pub strike_rate_last_5: Option<f64>,
    #[serde(default)]
    pub venue_avg_runs: Option<f64>,
    #[serde(default)]
    pub venue_avg_strike_rate: Option<f64>,
    #[serde(default)]
    pub opponent_avg_runs: Option<f64>,
    #[serde(default)]
    pub opponent_avg_strike_rate: Option<f64>,
    #[serde(default)]
    pub is_home_match: Option<f64>,
    #[serde(default)]
    pub batting_position: Option<f64>,
}

/// Where a field's value came from, best source first. Tier order matters:
/// confidence grading compares against `LiveComputed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FallbackTier {
    CallerProvided,
    LiveComputed,
    CorpusMean,
    LiteralDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn score(self) -> f64 {
        match self {
            Confidence::High => 0.85,
            Confidence::Medium => 0.65,
            Confidence::Low => 0.45,
        }
    }
}

/// The assembled vector plus provenance the caller can surface alongside the
/// prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineFeatures {
    pub vector: FeatureVector,
    pub runs_form_tier: FallbackTier,
    pub strike_rate_form_tier: FallbackTier,
    pub confidence: Confidence,
    pub confidence_score: f64,
    pub recent: Option<RecentForm>,
}

fn resolve_field(
    caller: Option<f64>,
    live: Option<f64>,
    corpus_mean: Option<f64>,
    literal: f64,
) -> (f64, FallbackTier) {
    if let Some(v) = caller {
        return (v, FallbackTier::CallerProvided);
    }
    if let Some(v) = live.filter(|v| v.is_finite()) {
        return (v, FallbackTier::LiveComputed);
    }
    if let Some(v) = corpus_mean.filter(|v| v.is_finite()) {
        return (v, FallbackTier::CorpusMean);
    }
    (literal, FallbackTier::LiteralDefault)
}

fn required(value: &str, field: &'static str) -> Result<(), FeatureError> {
    if value.trim().is_empty() {
        return Err(FeatureError::MissingRequiredField(field));
    }
    Ok(())
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

/// Assembles a serving-time vector for one request. Every field walks the
/// same chain: caller override, then a value computed live from the snapshot,
/// then the snapshot-wide mean, then a literal default. An unknown player or
/// venue is not an error; it simply pushes those fields down the chain.
pub fn assemble_online(
    corpus: &Corpus,
    encoder: &CategoricalEncoder,
    req: &PredictionRequest,
) -> Result<OnlineFeatures, FeatureError> {
    required(&req.player, "player")?;
    required(&req.team, "team")?;
    required(&req.opponent, "opponent")?;
    required(&req.venue, "venue")?;

    let player = corpus.resolve_player(&req.player);
    let team = corpus.resolve_team(&req.team);
    let opponent = corpus.resolve_opponent(&req.opponent);
    let venue = corpus.resolve_venue(&req.venue);

    let recent = player.and_then(|p| recent_form(corpus, p));

    let venue_rows = venue.map(|v| corpus.venue_records(v)).unwrap_or_default();
    let opponent_rows = opponent
        .map(|o| corpus.opponent_records(o))
        .unwrap_or_default();

    let live_venue_runs = mean_of(venue_rows.iter().map(|r| r.runs_scored as f64));
    let live_venue_sr = mean_of(venue_rows.iter().map(|r| r.strike_rate));
    let live_opponent_runs = mean_of(opponent_rows.iter().map(|r| r.runs_scored as f64));
    let live_opponent_sr = mean_of(opponent_rows.iter().map(|r| r.strike_rate));

    let corpus_runs = corpus.mean_runs();
    let corpus_sr = corpus.mean_strike_rate();

    let (runs_form, runs_form_tier) = resolve_field(
        req.runs_last_5_avg,
        recent.map(|f| f.runs_last_5_avg),
        corpus_runs,
        DEFAULT_RUNS,
    );
    let (sr_form, strike_rate_form_tier) = resolve_field(
        req.strike_rate_last_5,
        recent.map(|f| f.strike_rate_last_5),
        corpus_sr,
        DEFAULT_STRIKE_RATE,
    );
    let (venue_runs, _) = resolve_field(
        req.venue_avg_runs,
        live_venue_runs,
        corpus_runs,
        DEFAULT_VENUE_RUNS,
    );
    let (venue_sr, _) = resolve_field(
        req.venue_avg_strike_rate,
        live_venue_sr,
        corpus_sr,
        DEFAULT_STRIKE_RATE,
    );
    let (opponent_runs, _) = resolve_field(
        req.opponent_avg_runs,
        live_opponent_runs,
        corpus_runs,
        DEFAULT_RUNS,
    );
    let (opponent_sr, _) = resolve_field(
        req.opponent_avg_strike_rate,
        live_opponent_sr,
        corpus_sr,
        DEFAULT_STRIKE_RATE,
    );

    let is_home = req.is_home_match.unwrap_or_else(|| {
        match (team, venue) {
            (Some(t), Some(v)) => {
                let homes = team_home_venues(corpus);
                if homes.get(t).is_some_and(|home| home == v) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    });

    let batting_position = req.batting_position.unwrap_or_else(|| {
        player
            .and_then(|p| player_batting_buckets(corpus).get(p).copied())
            .unwrap_or(DEFAULT_BATTING_BUCKET)
    });

    // Encode the canonical snapshot spelling when resolution succeeded, so a
    // fuzzy query maps to the same id the batch pipeline assigned.
    let vector = FeatureVector {
        player_id: encoder.encode(Category::Player, player.unwrap_or(&req.player)).id as f64,
        team_id: encoder.encode(Category::Team, team.unwrap_or(&req.team)).id as f64,
        opponent_id: encoder
            .encode(Category::Opponent, opponent.unwrap_or(&req.opponent))
            .id as f64,
        venue_id: encoder.encode(Category::Venue, venue.unwrap_or(&req.venue)).id as f64,
        runs_last_5_avg: runs_form,
        strike_rate_last_5: sr_form,
        venue_avg_runs: venue_runs,
        opponent_avg_runs: opponent_runs,
        is_home_match: is_home,
        batting_position,
        venue_avg_strike_rate: venue_sr,
        opponent_avg_strike_rate: opponent_sr,
    };

    let mut strong = 0;
    if runs_form_tier <= FallbackTier::LiveComputed {
        strong += 1;
    }
    if strike_rate_form_tier <= FallbackTier::LiveComputed {
        strong += 1;
    }
    if recent.is_some_and(|f| f.matches_played > RELIABLE_MATCHES) {
        strong += 1;
    }
    let confidence = match strong {
        s if s >= 2 => Confidence::High,
        1 => Confidence::Medium,
        _ => Confidence::Low,
    };

    debug!(
        player = %req.player,
        resolved = player.is_some(),
        runs_tier = ?runs_form_tier,
        confidence = ?confidence,
        "assembled online features"
    );

    Ok(OnlineFeatures {
        vector,
        runs_form_tier,
        strike_rate_form_tier,
        confidence,
        confidence_score: confidence.score(),
        recent,
    })
}
