use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;

use crickform::corpus::{Corpus, MatchRecord};
use crickform::encoder::CategoricalEncoder;
use crickform::features::build_feature_table;
use crickform::online::{PredictionRequest, assemble_online};
use crickform::rolling::compute_rolling_form;

const PLAYERS: usize = 100;
const INNINGS_PER_PLAYER: usize = 20;

fn synthetic_rows() -> Vec<MatchRecord> {
    let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    let mut rows = Vec::with_capacity(PLAYERS * INNINGS_PER_PLAYER);
    let mut match_id = 0u64;
    for p in 0..PLAYERS {
        for i in 0..INNINGS_PER_PLAYER {
            match_id += 1;
            let runs = ((p * 7 + i * 13) % 90) as u32;
            let balls = 10 + ((p * 3 + i * 5) % 50) as u32;
            let date = start + chrono::Days::new((i * 4 + p % 4) as u64);
            rows.push(MatchRecord {
                match_id,
                player: format!("Player {p:03}"),
                team: format!("Team {:02}", p % 10),
                opponent: format!("Team {:02}", (p + 1) % 10),
                venue: format!("Venue {:02}", (p + i) % 12),
                date,
                season: 2022,
                runs_scored: runs,
                balls_faced: balls,
                strike_rate: MatchRecord::strike_rate_from(runs, balls),
            });
        }
    }
    rows
}

fn bench_rolling_form(c: &mut Criterion) {
    let corpus = Corpus::new(synthetic_rows());
    c.bench_function("rolling_form", |b| {
        b.iter(|| {
            let form = compute_rolling_form(black_box(&corpus));
            black_box(form.stats(5, 0));
        })
    });
}

fn bench_batch_assembly(c: &mut Criterion) {
    let corpus = Corpus::new(synthetic_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    c.bench_function("batch_assembly", |b| {
        b.iter(|| {
            let rows = build_feature_table(black_box(&corpus), black_box(&encoder)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_online_assembly(c: &mut Criterion) {
    let corpus = Corpus::new(synthetic_rows());
    let encoder = CategoricalEncoder::fit(&corpus);
    let request = PredictionRequest {
        player: "player 042".to_string(),
        team: "team 02".to_string(),
        opponent: "team 03".to_string(),
        venue: "venue 05".to_string(),
        ..PredictionRequest::default()
    };
    c.bench_function("online_assembly", |b| {
        b.iter(|| {
            let out =
                assemble_online(black_box(&corpus), black_box(&encoder), black_box(&request))
                    .unwrap();
            black_box(out.vector.runs_last_5_avg);
        })
    });
}

criterion_group!(perf, bench_rolling_form, bench_batch_assembly, bench_online_assembly);
criterion_main!(perf);
