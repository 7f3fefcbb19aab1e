use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};

use crate::corpus::MatchRecord;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS player_innings (
            match_id INTEGER NOT NULL,
            player TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT NOT NULL,
            venue TEXT NOT NULL,
            match_date TEXT NOT NULL,
            season INTEGER NOT NULL,
            runs_scored INTEGER NOT NULL,
            balls_faced INTEGER NOT NULL,
            strike_rate REAL NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (match_id, player)
        );
        CREATE INDEX IF NOT EXISTS idx_innings_player ON player_innings(player);
        CREATE INDEX IF NOT EXISTS idx_innings_venue ON player_innings(venue);
        CREATE INDEX IF NOT EXISTS idx_innings_opponent ON player_innings(opponent);
        CREATE INDEX IF NOT EXISTS idx_innings_date ON player_innings(match_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_innings(conn: &mut Connection, rows: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin innings transaction")?;
    let mut upserted = 0usize;
    for r in rows {
        tx.execute(
            r#"
            INSERT INTO player_innings (
                match_id, player, team, opponent, venue,
                match_date, season, runs_scored, balls_faced, strike_rate,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(match_id, player) DO UPDATE SET
                team = excluded.team,
                opponent = excluded.opponent,
                venue = excluded.venue,
                match_date = excluded.match_date,
                season = excluded.season,
                runs_scored = excluded.runs_scored,
                balls_faced = excluded.balls_faced,
                strike_rate = excluded.strike_rate,
                updated_at = excluded.updated_at
            "#,
            params![
                r.match_id as i64,
                r.player,
                r.team,
                r.opponent,
                r.venue,
                r.date.to_string(),
                r.season as i64,
                r.runs_scored as i64,
                r.balls_faced as i64,
                r.strike_rate,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert innings")?;
        upserted += 1;
    }
    tx.commit().context("commit innings transaction")?;
    Ok(upserted)
}

/// Loads every usable innings in chronological order. Rows with zero balls
/// faced carry no strike-rate signal and are filtered at the query.
pub fn load_innings(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, player, team, opponent, venue,
                match_date, season, runs_scored, balls_faced
            FROM player_innings
            WHERE balls_faced > 0
            ORDER BY match_date ASC, match_id ASC
            "#,
        )
        .context("prepare load innings query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, u32>(7)?,
                row.get::<_, u32>(8)?,
            ))
        })
        .context("query load innings")?;

    let mut out = Vec::new();
    for row in rows {
        let (match_id, player, team, opponent, venue, date, season, runs_scored, balls_faced) =
            row.context("decode innings row")?;
        let date = date
            .parse::<NaiveDate>()
            .with_context(|| format!("bad match_date {date:?} for match {match_id}"))?;
        out.push(MatchRecord {
            match_id,
            player,
            team,
            opponent,
            venue,
            date,
            season,
            runs_scored,
            balls_faced,
            strike_rate: MatchRecord::strike_rate_from(runs_scored, balls_faced),
        });
    }
    Ok(out)
}
