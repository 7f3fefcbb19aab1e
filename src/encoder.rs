use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::corpus::Corpus;

/// Synthetic ids for values never seen at fit time start here, keeping them
/// numerically disjoint from the sequential ids assigned over the corpus.
pub const SYNTHETIC_ID_BASE: u32 = 1_000_000;
const SYNTHETIC_ID_SPAN: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Team,
    Opponent,
    Venue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    pub id: u32,
    /// False when the value was absent from the fit corpus and the id is a
    /// hash-derived synthetic one.
    pub known: bool,
}

/// Value-to-integer mappings fit once over the full corpus and persisted with
/// the model. Distinct values are sorted before ids are assigned, so two fits
/// over identical data always agree. Mappings are never updated in place; a
/// new fit accompanies every retrain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    players: BTreeMap<String, u32>,
    teams: BTreeMap<String, u32>,
    opponents: BTreeMap<String, u32>,
    venues: BTreeMap<String, u32>,
}

impl CategoricalEncoder {
    pub fn fit(corpus: &Corpus) -> Self {
        Self {
            players: sequential_ids(corpus.players().iter()),
            teams: sequential_ids(corpus.teams().iter()),
            opponents: sequential_ids(corpus.opponents().iter()),
            venues: sequential_ids(corpus.venues().iter()),
        }
    }

    pub fn encode(&self, category: Category, value: &str) -> Encoded {
        let map = self.map(category);
        match map.get(value) {
            Some(&id) => Encoded { id, known: true },
            None => Encoded {
                id: synthetic_id(value),
                known: false,
            },
        }
    }

    pub fn known_values(&self, category: Category) -> usize {
        self.map(category).len()
    }

    fn map(&self, category: Category) -> &BTreeMap<String, u32> {
        match category {
            Category::Player => &self.players,
            Category::Team => &self.teams,
            Category::Opponent => &self.opponents,
            Category::Venue => &self.venues,
        }
    }
}

fn sequential_ids<'a, I>(values: I) -> BTreeMap<String, u32>
where
    I: Iterator<Item = &'a String>,
{
    // BTreeSet iteration is already sorted; enumeration order is the id.
    values
        .enumerate()
        .map(|(id, v)| (v.clone(), id as u32))
        .collect()
}

fn synthetic_id(value: &str) -> u32 {
    let digest = Sha256::digest(value.trim().to_lowercase().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    SYNTHETIC_ID_BASE + (u64::from_be_bytes(bytes) % SYNTHETIC_ID_SPAN) as u32
}
