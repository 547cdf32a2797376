//! Display-name assignment from a themed pool.
//!
//! Peers are anonymous; the only identity they carry besides the opaque
//! peer id is a display name drawn here. Names return to the pool
//! implicitly when the registry evicts their holder.

use rand::seq::SliceRandom;
use std::collections::HashSet;

/// The themed pool of display names handed to connecting peers.
const NAME_POOL: &[&str] = &[
    "Sirius", "Canopus", "Arcturus", "Vega", "Capella", "Rigel", "Procyon",
    "Achernar", "Betelgeuse", "Altair", "Aldebaran", "Antares", "Spica",
    "Pollux", "Fomalhaut", "Deneb", "Regulus", "Castor", "Bellatrix",
    "Alnilam", "Mintaka", "Saiph", "Polaris", "Mizar", "Alcor", "Algol",
    "Dubhe", "Merak", "Alioth", "Alkaid", "Electra", "Maia", "Taygeta",
    "Alcyone", "Atria", "Mimosa",
];

/// Hands out display names: a random name not currently in use, or a
/// numbered fallback once the pool is exhausted. Exhaustion never rejects
/// an admission.
#[derive(Debug, Default)]
pub struct NameAssigner {
    fallback_seq: u64,
}

impl NameAssigner {
    pub fn new() -> Self {
        Self { fallback_seq: 0 }
    }

    /// Draw a display name, avoiding everything in `in_use`.
    pub fn assign(&mut self, in_use: &HashSet<String>) -> String {
        let available: Vec<&str> = NAME_POOL
            .iter()
            .copied()
            .filter(|name| !in_use.contains(*name))
            .collect();

        if let Some(name) = available.choose(&mut rand::thread_rng()) {
            return (*name).to_string();
        }

        self.fallback_seq += 1;
        format!("Visitor-{}", self.fallback_seq)
    }

    /// Number of names in the themed pool.
    pub fn pool_size() -> usize {
        NAME_POOL.len()
    }
}
