use std::collections::{BTreeMap, HashMap};

use crate::corpus::Corpus;

/// Bucket used when quantile binning cannot place a record (middle order).
pub const DEFAULT_BATTING_BUCKET: f64 = 6.0;
/// Rest-day value for a player's first recorded match.
pub const DEFAULT_REST_DAYS: f64 = 7.0;
/// Rest days are capped so off-season gaps do not distort the signal.
pub const MAX_REST_DAYS: f64 = 30.0;
const BATTING_BUCKETS: usize = 11;

/// Per-record match-context columns, aligned with corpus record indices.
#[derive(Debug)]
pub struct MatchContext {
    pub is_home: Vec<f64>,
    pub batting_position: Vec<f64>,
    pub days_since_last: Vec<f64>,
    pub match_in_season: Vec<f64>,
}

/// Each team's home venue: its single most frequent venue, ties broken by
/// the first venue in sorted order.
pub fn team_home_venues(corpus: &Corpus) -> HashMap<String, String> {
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for r in corpus.records() {
        *counts
            .entry(r.team.as_str())
            .or_default()
            .entry(r.venue.as_str())
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(team, venues)| {
            let mut best: Option<(&str, usize)> = None;
            // Sorted venue order; strict greater-than keeps the first of a tie.
            for (venue, count) in venues {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((venue, count));
                }
            }
            best.map(|(venue, _)| (team.to_string(), venue.to_string()))
        })
        .collect()
}

/// Batting position proxy: each player's all-time mean balls faced, binned
/// into up to 11 quantile buckets over the record-level distribution. Bucket 1
/// is the fewest balls faced (late order), bucket 11 the most.
pub fn player_batting_buckets(corpus: &Corpus) -> HashMap<String, f64> {
    let records = corpus.records();
    if records.is_empty() {
        return HashMap::new();
    }

    let mut balls: HashMap<&str, (f64, usize)> = HashMap::new();
    for r in records {
        let e = balls.entry(r.player.as_str()).or_insert((0.0, 0));
        e.0 += r.balls_faced as f64;
        e.1 += 1;
    }
    let player_mean: HashMap<&str, f64> = balls
        .into_iter()
        .map(|(p, (sum, c))| (p, sum / c as f64))
        .collect();

    // Quantile edges come from the record-level series, the same population
    // the batch pipeline bins over.
    let mut series: Vec<f64> = records
        .iter()
        .map(|r| player_mean[r.player.as_str()])
        .collect();
    series.sort_by(|a, b| a.total_cmp(b));
    let mut edges: Vec<f64> = (0..=BATTING_BUCKETS)
        .map(|k| quantile_sorted(&series, k as f64 / BATTING_BUCKETS as f64))
        .collect();
    edges.dedup();

    player_mean
        .into_iter()
        .map(|(player, mean)| (player.to_string(), bucket_for(&edges, mean)))
        .collect()
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = p * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn bucket_for(edges: &[f64], value: f64) -> f64 {
    // Fewer than two distinct edges means no interval can be formed.
    if edges.len() < 2 {
        return DEFAULT_BATTING_BUCKET;
    }
    if value <= edges[0] {
        return 1.0;
    }
    for (k, window) in edges.windows(2).enumerate() {
        if value > window[0] && value <= window[1] {
            return (k + 1) as f64;
        }
    }
    DEFAULT_BATTING_BUCKET
}

pub fn compute_match_context(corpus: &Corpus) -> MatchContext {
    let records = corpus.records();
    let n = records.len();

    let home_venues = team_home_venues(corpus);
    let buckets = player_batting_buckets(corpus);

    let mut is_home = vec![0.0; n];
    let mut batting_position = vec![DEFAULT_BATTING_BUCKET; n];
    for (idx, r) in records.iter().enumerate() {
        if home_venues.get(&r.team).is_some_and(|v| *v == r.venue) {
            is_home[idx] = 1.0;
        }
        if let Some(&bucket) = buckets.get(&r.player) {
            batting_position[idx] = bucket;
        }
    }

    let mut days_since_last = vec![DEFAULT_REST_DAYS; n];
    let mut match_in_season = vec![1.0; n];
    for (_, idxs) in corpus.player_groups() {
        let mut season_counts: HashMap<i32, u32> = HashMap::new();
        for (pos, &idx) in idxs.iter().enumerate() {
            if pos > 0 {
                let prev = idxs[pos - 1];
                let gap = (records[idx].date - records[prev].date).num_days() as f64;
                days_since_last[idx] = gap.clamp(0.0, MAX_REST_DAYS);
            }
            let count = season_counts.entry(records[idx].season).or_insert(0);
            *count += 1;
            match_in_season[idx] = *count as f64;
        }
    }

    MatchContext {
        is_home,
        batting_position,
        days_since_last,
        match_in_season,
    }
}
