use chrono::NaiveDate;

use crickform::corpus::{Corpus, MatchRecord};
use crickform::encoder::{CategoricalEncoder, Category};
use crickform::features::{FEATURE_NAMES, FeatureVector, build_feature_table};

fn rec(
    match_id: u64,
    player: &str,
    team: &str,
    opponent: &str,
    venue: &str,
    (y, m, d): (i32, u32, u32),
    runs: u32,
    balls: u32,
) -> MatchRecord {
    MatchRecord {
        match_id,
        player: player.to_string(),
        team: team.to_string(),
        opponent: opponent.to_string(),
        venue: venue.to_string(),
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        season: y,
        runs_scored: runs,
        balls_faced: balls,
        strike_rate: MatchRecord::strike_rate_from(runs, balls),
    }
}

fn season_rows() -> Vec<MatchRecord> {
    vec![
        rec(1, "V Kohli", "RCB", "MI", "Chinnaswamy", (2023, 4, 1), 10, 10),
        rec(2, "V Kohli", "RCB", "CSK", "Chinnaswamy", (2023, 4, 5), 50, 30),
        rec(3, "V Kohli", "RCB", "MI", "Wankhede", (2023, 4, 9), 30, 20),
        rec(4, "V Kohli", "RCB", "CSK", "Chepauk", (2023, 4, 13), 70, 40),
        rec(5, "MS Dhoni", "CSK", "RCB", "Chepauk", (2023, 4, 13), 25, 12),
    ]
}

#[test]
fn form_features_are_strictly_causal() {
    let corpus = Corpus::new(season_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let baseline = build_feature_table(&corpus, &encoder).unwrap();

    // Inflate the final innings; nothing computed for earlier records may move.
    let mut mutated_rows = season_rows();
    mutated_rows[3].runs_scored = 200;
    mutated_rows[3].strike_rate = MatchRecord::strike_rate_from(200, 40);
    let mutated = build_feature_table(&Corpus::new(mutated_rows), &encoder).unwrap();

    for idx in 0..3 {
        assert_eq!(
            baseline[idx].features.runs_last_5_avg,
            mutated[idx].features.runs_last_5_avg
        );
        assert_eq!(
            baseline[idx].features.strike_rate_last_5,
            mutated[idx].features.strike_rate_last_5
        );
    }
}

#[test]
fn cold_start_and_shifted_window_means() {
    let corpus = Corpus::new(season_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let rows = build_feature_table(&corpus, &encoder).unwrap();

    // First innings of each player carries zero form.
    assert_eq!(rows[0].features.runs_last_5_avg, 0.0);
    assert_eq!(rows[4].features.runs_last_5_avg, 0.0);

    // Fourth innings sees the mean of the three priors: (10 + 50 + 30) / 3.
    assert!((rows[3].features.runs_last_5_avg - 30.0).abs() < 1e-9);
}

#[test]
fn venue_mean_is_shared_by_every_record_there() {
    let corpus = Corpus::new(season_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let rows = build_feature_table(&corpus, &encoder).unwrap();

    // Chinnaswamy hosts records 0 and 1: mean runs (10 + 50) / 2.
    assert!((rows[0].features.venue_avg_runs - 30.0).abs() < 1e-9);
    assert!((rows[1].features.venue_avg_runs - 30.0).abs() < 1e-9);
    // Chepauk hosts records 3 and 4: (70 + 25) / 2.
    assert!((rows[3].features.venue_avg_runs - 47.5).abs() < 1e-9);
    assert_eq!(rows[3].features.venue_avg_runs, rows[4].features.venue_avg_runs);
}

#[test]
fn targets_follow_record_order() {
    let corpus = Corpus::new(season_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let rows = build_feature_table(&corpus, &encoder).unwrap();
    let targets: Vec<f64> = rows.iter().map(|r| r.target_runs).collect();
    assert_eq!(targets, vec![10.0, 50.0, 30.0, 70.0, 25.0]);
}

#[test]
fn encoder_refit_on_same_corpus_yields_same_ids() {
    let corpus = Corpus::new(season_rows());
    let a = CategoricalEncoder::fit(&corpus);
    let b = CategoricalEncoder::fit(&corpus);
    for name in ["V Kohli", "MS Dhoni"] {
        assert_eq!(
            a.encode(Category::Player, name).id,
            b.encode(Category::Player, name).id
        );
    }
    for venue in ["Chinnaswamy", "Wankhede", "Chepauk"] {
        assert_eq!(
            a.encode(Category::Venue, venue).id,
            b.encode(Category::Venue, venue).id
        );
    }
}

#[test]
fn vector_dimension_matches_the_published_schema() {
    let corpus = Corpus::new(season_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let rows = build_feature_table(&corpus, &encoder).unwrap();
    assert_eq!(FeatureVector::DIM, FEATURE_NAMES.len());
    assert_eq!(rows[0].features.to_array().len(), FEATURE_NAMES.len());
}
