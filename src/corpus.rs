use std::collections::BTreeSet;

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// One batting innings: a single (player, match) row of the historical
/// snapshot. The external ingestion layer guarantees `balls_faced > 0` and
/// exactly one row per (player, match) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u64,
    pub player: String,
    pub team: String,
    pub opponent: String,
    pub venue: String,
    pub date: NaiveDate,
    pub season: i32,
    pub runs_scored: u32,
    pub balls_faced: u32,
    pub strike_rate: f64,
}

impl MatchRecord {
    pub fn strike_rate_from(runs: u32, balls: u32) -> f64 {
        if balls == 0 {
            0.0
        } else {
            runs as f64 / balls as f64 * 100.0
        }
    }
}

/// The in-memory, read-only historical snapshot consulted by both the batch
/// derivation pipeline and per-request online reconstruction. Records keep
/// their supplied order; every derivation sorts per entity by (date, index)
/// so ties in date stay reproducible.
#[derive(Debug)]
pub struct Corpus {
    records: Vec<MatchRecord>,
    players: BTreeSet<String>,
    teams: BTreeSet<String>,
    opponents: BTreeSet<String>,
    venues: BTreeSet<String>,
    mean_runs: OnceCell<f64>,
    mean_strike_rate: OnceCell<f64>,
}

impl Corpus {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        let mut players = BTreeSet::new();
        let mut teams = BTreeSet::new();
        let mut opponents = BTreeSet::new();
        let mut venues = BTreeSet::new();
        for r in &records {
            players.insert(r.player.clone());
            teams.insert(r.team.clone());
            opponents.insert(r.opponent.clone());
            venues.insert(r.venue.clone());
        }
        Self {
            records,
            players,
            teams,
            opponents,
            venues,
            mean_runs: OnceCell::new(),
            mean_strike_rate: OnceCell::new(),
        }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn players(&self) -> &BTreeSet<String> {
        &self.players
    }

    pub fn teams(&self) -> &BTreeSet<String> {
        &self.teams
    }

    pub fn opponents(&self) -> &BTreeSet<String> {
        &self.opponents
    }

    pub fn venues(&self) -> &BTreeSet<String> {
        &self.venues
    }

    /// Corpus-wide mean of runs scored, cached after first use. Returns None
    /// on an empty snapshot so callers fall through to literal defaults.
    pub fn mean_runs(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        Some(*self.mean_runs.get_or_init(|| {
            let sum: f64 = self.records.iter().map(|r| r.runs_scored as f64).sum();
            sum / self.records.len() as f64
        }))
    }

    pub fn mean_strike_rate(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        Some(*self.mean_strike_rate.get_or_init(|| {
            let sum: f64 = self.records.iter().map(|r| r.strike_rate).sum();
            sum / self.records.len() as f64
        }))
    }

    pub fn resolve_player(&self, query: &str) -> Option<&str> {
        resolve_name(self.players.iter().map(String::as_str), query)
    }

    pub fn resolve_team(&self, query: &str) -> Option<&str> {
        resolve_name(self.teams.iter().map(String::as_str), query)
    }

    pub fn resolve_opponent(&self, query: &str) -> Option<&str> {
        resolve_name(self.opponents.iter().map(String::as_str), query)
    }

    pub fn resolve_venue(&self, query: &str) -> Option<&str> {
        resolve_name(self.venues.iter().map(String::as_str), query)
    }

    /// All records for the canonical player name resolved from `query`.
    pub fn player_records(&self, query: &str) -> Vec<&MatchRecord> {
        let Some(name) = self.resolve_player(query) else {
            return Vec::new();
        };
        self.records.iter().filter(|r| r.player == name).collect()
    }

    pub fn venue_records(&self, query: &str) -> Vec<&MatchRecord> {
        let Some(name) = self.resolve_venue(query) else {
            return Vec::new();
        };
        self.records.iter().filter(|r| r.venue == name).collect()
    }

    pub fn opponent_records(&self, query: &str) -> Vec<&MatchRecord> {
        let Some(name) = self.resolve_opponent(query) else {
            return Vec::new();
        };
        self.records.iter().filter(|r| r.opponent == name).collect()
    }

    /// Record indices grouped by player, each group sorted chronologically
    /// (date ascending, original order breaking ties).
    pub fn player_groups(&self) -> Vec<(&str, Vec<usize>)> {
        let mut groups: std::collections::BTreeMap<&str, Vec<usize>> =
            std::collections::BTreeMap::new();
        for (idx, r) in self.records.iter().enumerate() {
            groups.entry(r.player.as_str()).or_default().push(idx);
        }
        groups
            .into_iter()
            .map(|(player, mut idxs)| {
                idxs.sort_by_key(|&i| (self.records[i].date, i));
                (player, idxs)
            })
            .collect()
    }
}

/// Shared entity resolution used by the query layer and the online assembler:
/// case-insensitive substring match over distinct names. Tie-break is
/// deterministic: an exact (case-insensitive) match wins outright, otherwise
/// the first candidate in sorted order.
pub fn resolve_name<'a, I>(candidates: I, query: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let mut first_partial: Option<&str> = None;
    for name in candidates {
        let hay = name.to_lowercase();
        if hay == needle {
            return Some(name);
        }
        if first_partial.is_none() && hay.contains(&needle) {
            first_partial = Some(name);
        }
    }
    first_partial
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::MatchRecord;
    use chrono::NaiveDate;

    pub fn record(
        match_id: u64,
        player: &str,
        team: &str,
        opponent: &str,
        venue: &str,
        date: (i32, u32, u32),
        runs: u32,
        balls: u32,
    ) -> MatchRecord {
        MatchRecord {
            match_id,
            player: player.to_string(),
            team: team.to_string(),
            opponent: opponent.to_string(),
            venue: venue.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            season: date.0,
            runs_scored: runs,
            balls_faced: balls,
            strike_rate: MatchRecord::strike_rate_from(runs, balls),
        }
    }
}
