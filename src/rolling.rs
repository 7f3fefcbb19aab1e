use rayon::prelude::*;

use crate::corpus::Corpus;

/// Window sizes for recency form, matching the `<metric>_last_<w>` columns.
pub const FORM_WINDOWS: [usize; 2] = [5, 10];

/// Windowed means of the base metrics over the strictly-prior records of one
/// player. A record's stats never include the record itself; a player's first
/// record resolves to zeros (cold start is "unknown", not a lifetime average).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingStats {
    pub runs_avg: f64,
    pub strike_rate_avg: f64,
    pub balls_faced_avg: f64,
}

/// Per-record rolling form, aligned with corpus record indices.
#[derive(Debug)]
pub struct RollingForm {
    window5: Vec<RollingStats>,
    window10: Vec<RollingStats>,
}

impl RollingForm {
    pub fn stats(&self, window: usize, record_idx: usize) -> RollingStats {
        let column = match window {
            5 => &self.window5,
            10 => &self.window10,
            _ => return RollingStats::default(),
        };
        column.get(record_idx).copied().unwrap_or_default()
    }
}

/// Computes rolling form for every record. Players are independent, so the
/// per-player walks run in parallel; results are scattered back into
/// record-index order afterwards.
pub fn compute_rolling_form(corpus: &Corpus) -> RollingForm {
    let records = corpus.records();
    let mut window5 = vec![RollingStats::default(); records.len()];
    let mut window10 = vec![RollingStats::default(); records.len()];

    let groups = corpus.player_groups();
    let per_player: Vec<Vec<(usize, RollingStats, RollingStats)>> = groups
        .par_iter()
        .map(|(_, idxs)| {
            idxs.iter()
                .enumerate()
                .map(|(pos, &idx)| {
                    (
                        idx,
                        window_mean(records, idxs, pos, 5),
                        window_mean(records, idxs, pos, 10),
                    )
                })
                .collect()
        })
        .collect();

    for group in per_player {
        for (idx, w5, w10) in group {
            window5[idx] = w5;
            window10[idx] = w10;
        }
    }

    RollingForm { window5, window10 }
}

fn window_mean(
    records: &[crate::corpus::MatchRecord],
    idxs: &[usize],
    pos: usize,
    window: usize,
) -> RollingStats {
    if pos == 0 {
        return RollingStats::default();
    }
    let lo = pos.saturating_sub(window);
    let prior = &idxs[lo..pos];
    let n = prior.len() as f64;

    let mut runs = 0.0;
    let mut sr = 0.0;
    let mut balls = 0.0;
    for &i in prior {
        runs += records[i].runs_scored as f64;
        sr += records[i].strike_rate;
        balls += records[i].balls_faced as f64;
    }
    RollingStats {
        runs_avg: runs / n,
        strike_rate_avg: sr / n,
        balls_faced_avg: balls / n,
    }
}
