use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, MatchRecord};

const RECENT_FORM_MATCHES: usize = 5;
const MIN_MATCHES_FOR_FORM: usize = 3;

/// A player's live recency stats, computed from the snapshot on demand. This
/// is the tier-2 source for the online assembler's form fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecentForm {
    pub runs_last_5_avg: f64,
    pub strike_rate_last_5: f64,
    pub matches_played: usize,
    pub career_avg: f64,
    pub highest_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormEntry {
    pub date: NaiveDate,
    pub runs_scored: u32,
    pub strike_rate: f64,
    pub opponent: String,
    pub venue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub matches: usize,
    pub total_runs: u64,
    pub average: f64,
    pub highest_score: u32,
    pub strike_rate: f64,
    pub fifties: usize,
    pub hundreds: usize,
    pub ducks: usize,
    pub recent_form: Vec<FormEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerRow {
    pub player: String,
    pub total_runs: u64,
    pub avg_runs: f64,
    pub matches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSummary {
    pub venue: String,
    pub matches: usize,
    pub avg_runs: f64,
    pub avg_strike_rate: f64,
    pub highest_score: u32,
    pub total_runs: u64,
    pub top_scorers: Vec<ScorerRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupSummary {
    pub player: String,
    pub opponent: String,
    pub matches: usize,
    pub total_runs: u64,
    pub avg_runs: f64,
    pub highest_score: u32,
    pub avg_strike_rate: f64,
    pub performances: Vec<FormEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAggRow {
    pub player: String,
    pub matches: usize,
    pub total_runs: u64,
    pub avg_runs: f64,
    pub highest_score: u32,
    pub avg_strike_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRankingRow {
    pub player: String,
    pub form_score: f64,
    pub avg_strike_rate: f64,
    pub matches: usize,
}

/// Records sorted most recent first (date descending, later supplied records
/// first on ties), mirroring how every recency query reads the snapshot.
fn most_recent_first<'a>(mut rows: Vec<(usize, &'a MatchRecord)>) -> Vec<&'a MatchRecord> {
    rows.sort_by(|a, b| b.1.date.cmp(&a.1.date).then(b.0.cmp(&a.0)));
    rows.into_iter().map(|(_, r)| r).collect()
}

fn indexed<'a>(corpus: &'a Corpus, filter: impl Fn(&MatchRecord) -> bool) -> Vec<(usize, &'a MatchRecord)> {
    corpus
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| filter(r))
        .collect()
}

pub fn recent_form(corpus: &Corpus, player: &str) -> Option<RecentForm> {
    let name = corpus.resolve_player(player)?;
    let rows = most_recent_first(indexed(corpus, |r| r.player == name));
    if rows.is_empty() {
        return None;
    }

    let last = &rows[..rows.len().min(RECENT_FORM_MATCHES)];
    let n = last.len() as f64;
    let total: u64 = rows.iter().map(|r| r.runs_scored as u64).sum();
    Some(RecentForm {
        runs_last_5_avg: last.iter().map(|r| r.runs_scored as f64).sum::<f64>() / n,
        strike_rate_last_5: last.iter().map(|r| r.strike_rate).sum::<f64>() / n,
        matches_played: rows.len(),
        career_avg: total as f64 / rows.len() as f64,
        highest_score: rows.iter().map(|r| r.runs_scored).max().unwrap_or(0),
    })
}

pub fn player_summary(corpus: &Corpus, player: &str) -> Option<PlayerSummary> {
    let name = corpus.resolve_player(player)?;
    let rows = most_recent_first(indexed(corpus, |r| r.player == name));
    if rows.is_empty() {
        return None;
    }

    let matches = rows.len();
    let total_runs: u64 = rows.iter().map(|r| r.runs_scored as u64).sum();
    Some(PlayerSummary {
        name: name.to_string(),
        matches,
        total_runs,
        average: total_runs as f64 / matches as f64,
        highest_score: rows.iter().map(|r| r.runs_scored).max().unwrap_or(0),
        strike_rate: rows.iter().map(|r| r.strike_rate).sum::<f64>() / matches as f64,
        fifties: rows.iter().filter(|r| r.runs_scored >= 50).count(),
        hundreds: rows.iter().filter(|r| r.runs_scored >= 100).count(),
        ducks: rows.iter().filter(|r| r.runs_scored == 0).count(),
        recent_form: rows
            .iter()
            .take(RECENT_FORM_MATCHES)
            .map(|r| form_entry(r))
            .collect(),
    })
}

pub fn venue_summary(corpus: &Corpus, venue: &str) -> Option<VenueSummary> {
    let name = corpus.resolve_venue(venue)?;
    let rows: Vec<&MatchRecord> = corpus.venue_records(name);
    if rows.is_empty() {
        return None;
    }

    let total_runs: u64 = rows.iter().map(|r| r.runs_scored as u64).sum();
    let mut by_player: std::collections::HashMap<&str, (u64, usize)> =
        std::collections::HashMap::new();
    for r in &rows {
        let e = by_player.entry(r.player.as_str()).or_insert((0, 0));
        e.0 += r.runs_scored as u64;
        e.1 += 1;
    }
    let mut top_scorers: Vec<ScorerRow> = by_player
        .into_iter()
        .map(|(player, (runs, count))| ScorerRow {
            player: player.to_string(),
            total_runs: runs,
            avg_runs: runs as f64 / count as f64,
            matches: count,
        })
        .collect();
    top_scorers.sort_by(|a, b| b.total_runs.cmp(&a.total_runs).then(a.player.cmp(&b.player)));
    top_scorers.truncate(10);

    let distinct_matches: std::collections::HashSet<u64> =
        rows.iter().map(|r| r.match_id).collect();
    Some(VenueSummary {
        venue: name.to_string(),
        matches: distinct_matches.len(),
        avg_runs: total_runs as f64 / rows.len() as f64,
        avg_strike_rate: rows.iter().map(|r| r.strike_rate).sum::<f64>() / rows.len() as f64,
        highest_score: rows.iter().map(|r| r.runs_scored).max().unwrap_or(0),
        total_runs,
        top_scorers,
    })
}

pub fn matchup(corpus: &Corpus, player: &str, opponent: &str) -> Option<MatchupSummary> {
    let player_name = corpus.resolve_player(player)?;
    let opponent_name = corpus.resolve_opponent(opponent)?;
    let rows = most_recent_first(indexed(corpus, |r| {
        r.player == player_name && r.opponent == opponent_name
    }));
    if rows.is_empty() {
        return None;
    }

    let total_runs: u64 = rows.iter().map(|r| r.runs_scored as u64).sum();
    Some(MatchupSummary {
        player: player_name.to_string(),
        opponent: opponent_name.to_string(),
        matches: rows.len(),
        total_runs,
        avg_runs: total_runs as f64 / rows.len() as f64,
        highest_score: rows.iter().map(|r| r.runs_scored).max().unwrap_or(0),
        avg_strike_rate: rows.iter().map(|r| r.strike_rate).sum::<f64>() / rows.len() as f64,
        performances: rows.iter().take(10).map(|r| form_entry(r)).collect(),
    })
}

fn player_aggregates(corpus: &Corpus) -> Vec<PlayerAggRow> {
    let mut by_player: std::collections::BTreeMap<&str, Vec<&MatchRecord>> =
        std::collections::BTreeMap::new();
    for r in corpus.records() {
        by_player.entry(r.player.as_str()).or_default().push(r);
    }
    by_player
        .into_iter()
        .map(|(player, rows)| {
            let total_runs: u64 = rows.iter().map(|r| r.runs_scored as u64).sum();
            PlayerAggRow {
                player: player.to_string(),
                matches: rows.len(),
                total_runs,
                avg_runs: total_runs as f64 / rows.len() as f64,
                highest_score: rows.iter().map(|r| r.runs_scored).max().unwrap_or(0),
                avg_strike_rate: rows.iter().map(|r| r.strike_rate).sum::<f64>()
                    / rows.len() as f64,
            }
        })
        .collect()
}

pub fn leaderboard_runs(corpus: &Corpus, limit: usize) -> Vec<PlayerAggRow> {
    let mut rows = player_aggregates(corpus);
    rows.sort_by(|a, b| b.total_runs.cmp(&a.total_runs).then(a.player.cmp(&b.player)));
    rows.truncate(limit);
    rows
}

pub fn leaderboard_strike_rate(
    corpus: &Corpus,
    limit: usize,
    min_matches: usize,
) -> Vec<PlayerAggRow> {
    let mut rows: Vec<PlayerAggRow> = player_aggregates(corpus)
        .into_iter()
        .filter(|r| r.matches >= min_matches)
        .collect();
    rows.sort_by(|a, b| {
        b.avg_strike_rate
            .total_cmp(&a.avg_strike_rate)
            .then(a.player.cmp(&b.player))
    });
    rows.truncate(limit);
    rows
}

pub fn leaderboard_average(corpus: &Corpus, limit: usize, min_matches: usize) -> Vec<PlayerAggRow> {
    let mut rows: Vec<PlayerAggRow> = player_aggregates(corpus)
        .into_iter()
        .filter(|r| r.matches >= min_matches)
        .collect();
    rows.sort_by(|a, b| b.avg_runs.total_cmp(&a.avg_runs).then(a.player.cmp(&b.player)));
    rows.truncate(limit);
    rows
}

/// Players ranked by mean runs over their five most recent innings. Players
/// with fewer than three innings are left out; thin samples rank noisily.
pub fn form_rankings(corpus: &Corpus, limit: usize) -> Vec<FormRankingRow> {
    let mut rows: Vec<FormRankingRow> = corpus
        .players()
        .iter()
        .filter_map(|player| {
            let form = recent_form(corpus, player)?;
            if form.matches_played < MIN_MATCHES_FOR_FORM {
                return None;
            }
            Some(FormRankingRow {
                player: player.clone(),
                form_score: form.runs_last_5_avg,
                avg_strike_rate: form.strike_rate_last_5,
                matches: form.matches_played,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.form_score.total_cmp(&a.form_score).then(a.player.cmp(&b.player)));
    rows.truncate(limit);
    rows
}

fn form_entry(r: &MatchRecord) -> FormEntry {
    FormEntry {
        date: r.date,
        runs_scored: r.runs_scored,
        strike_rate: r.strike_rate,
        opponent: r.opponent.clone(),
        venue: r.venue.clone(),
    }
}
