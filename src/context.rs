use std::collections::HashMap;

use crate::corpus::{Corpus, MatchRecord};

/// Grouping dimension for contextual aggregates. Venue and opponent run the
/// identical two-pass algorithm; only the grouping key differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Venue,
    Opponent,
}

impl Dimension {
    fn value<'a>(self, r: &'a MatchRecord) -> &'a str {
        match self {
            Dimension::Venue => &r.venue,
            Dimension::Opponent => &r.opponent,
        }
    }
}

/// Per-record contextual aggregates for one dimension.
///
/// `avg_runs` / `avg_strike_rate` are dimension-wide means broadcast to every
/// record sharing the value, deliberately unshifted: they describe the venue
/// or opponent itself rather than the player's future. The player-level
/// expanding mean IS shifted, and falls back to the dimension-wide mean when
/// the player has no prior history at that value.
#[derive(Debug)]
pub struct DimensionAggregates {
    pub avg_runs: Vec<f64>,
    pub avg_strike_rate: Vec<f64>,
    pub player_avg_runs: Vec<f64>,
}

pub fn compute_dimension_aggregates(corpus: &Corpus, dim: Dimension) -> DimensionAggregates {
    let records = corpus.records();
    let n = records.len();

    // Pass 1: dimension-wide means. Must be complete before pass 2, which
    // reads them as the cold-start fallback.
    let mut sums: HashMap<&str, (f64, f64, usize)> = HashMap::new();
    for r in records {
        let e = sums.entry(dim.value(r)).or_insert((0.0, 0.0, 0));
        e.0 += r.runs_scored as f64;
        e.1 += r.strike_rate;
        e.2 += 1;
    }
    let wide: HashMap<&str, (f64, f64)> = sums
        .into_iter()
        .map(|(k, (runs, sr, c))| (k, (runs / c as f64, sr / c as f64)))
        .collect();

    let mut avg_runs = vec![0.0; n];
    let mut avg_strike_rate = vec![0.0; n];
    for (idx, r) in records.iter().enumerate() {
        if let Some(&(runs, sr)) = wide.get(dim.value(r)) {
            avg_runs[idx] = runs;
            avg_strike_rate[idx] = sr;
        }
    }

    // Pass 2: player x dimension expanding mean of runs, shifted one record.
    let mut player_avg_runs = vec![0.0; n];
    let mut pairs: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (idx, r) in records.iter().enumerate() {
        pairs
            .entry((r.player.as_str(), dim.value(r)))
            .or_default()
            .push(idx);
    }
    for ((_, value), mut idxs) in pairs {
        idxs.sort_by_key(|&i| (records[i].date, i));
        let mut sum = 0.0;
        for (pos, &idx) in idxs.iter().enumerate() {
            player_avg_runs[idx] = if pos == 0 {
                wide.get(value).map(|&(runs, _)| runs).unwrap_or(0.0)
            } else {
                sum / pos as f64
            };
            sum += records[idx].runs_scored as f64;
        }
    }

    DimensionAggregates {
        avg_runs,
        avg_strike_rate,
        player_avg_runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::test_support::record;

    fn venue_corpus() -> Corpus {
        Corpus::new(vec![
            record(1, "A", "T", "X", "V1", (2023, 4, 1), 10, 10),
            record(2, "A", "T", "X", "V1", (2023, 4, 5), 50, 30),
            record(3, "B", "T2", "X", "V1", (2023, 4, 9), 30, 20),
            record(4, "A", "T", "X", "V2", (2023, 4, 13), 60, 35),
        ])
    }

    #[test]
    fn dimension_wide_mean_is_broadcast_unshifted() {
        let agg = compute_dimension_aggregates(&venue_corpus(), Dimension::Venue);
        // V1 mean runs = (10 + 50 + 30) / 3 = 30, on every V1 record
        // including the earliest one.
        for idx in [0, 1, 2] {
            assert!((agg.avg_runs[idx] - 30.0).abs() < 1e-9);
        }
        assert!((agg.avg_runs[3] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn player_expanding_mean_is_shifted_with_wide_fallback() {
        let agg = compute_dimension_aggregates(&venue_corpus(), Dimension::Venue);
        // A's first V1 innings: no prior history there, falls back to the
        // venue-wide mean.
        assert!((agg.player_avg_runs[0] - 30.0).abs() < 1e-9);
        // A's second V1 innings: expanding mean of the single prior (10).
        assert!((agg.player_avg_runs[1] - 10.0).abs() < 1e-9);
        // B's only V1 innings falls back to the venue-wide mean too.
        assert!((agg.player_avg_runs[2] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn opponent_runs_same_algorithm_keyed_on_opponent() {
        let corpus = Corpus::new(vec![
            record(1, "A", "T", "MI", "V", (2023, 4, 1), 20, 10),
            record(2, "A", "T", "MI", "V", (2023, 4, 5), 40, 20),
            record(3, "A", "T", "CSK", "V", (2023, 4, 9), 80, 40),
        ]);
        let agg = compute_dimension_aggregates(&corpus, Dimension::Opponent);
        assert!((agg.avg_runs[0] - 30.0).abs() < 1e-9);
        assert!((agg.avg_runs[2] - 80.0).abs() < 1e-9);
        assert!((agg.player_avg_runs[1] - 20.0).abs() < 1e-9);
    }
}
