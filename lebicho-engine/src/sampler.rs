use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::debug;

use lebicho_db::models::{DigitWidth, Timeslot};

use crate::scorer::Accumulator;

/// Source d'aléa injectée dans l'échantillonneur.
pub trait RandomSource {
    /// Uniforme dans [0, 1).
    fn next_f64(&mut self) -> f64;
}

pub struct SeededSource(StdRng);

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededSource {
    fn next_f64(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Indice uniforme dans `0..len`, `len` non nul.
pub fn pick_index(rng: &mut dyn RandomSource, len: usize) -> usize {
    ((rng.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
}

/// `k` éléments pris à des positions distinctes (Fisher-Yates partiel).
pub fn pick_distinct<T: Copy>(items: &[T], k: usize, rng: &mut dyn RandomSource) -> Vec<T> {
    let mut pool = items.to_vec();
    let k = k.min(pool.len());
    for i in 0..k {
        let j = i + pick_index(rng, pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

/// Tranche d'une minute : deux appels dans la même minute partagent le seed.
pub fn minute_bucket(now: NaiveDateTime) -> i64 {
    now.and_utc().timestamp().div_euclid(60)
}

/// Seed déterministe : date (YYYYMMDD), horaire, largeur, puis tranche de minute.
pub fn reading_seed(date: NaiveDate, timeslot: Timeslot, width: DigitWidth, bucket: i64) -> u64 {
    let y = date.year() as u64;
    let m = date.month() as u64;
    let d = date.day() as u64;
    let base = ((y * 10_000 + m * 100 + d) * 100 + timeslot.hour() as u64) * 10 + width.digits() as u64;
    base.wrapping_mul(1_000_003).wrapping_add(bucket as u64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Chaînes formatées à la largeur, uniques, dans l'ordre de tirage.
    pub numbers: Vec<String>,
    /// Poids cumulé du premier candidat tiré.
    pub top_weight: Option<f64>,
    /// Poids maximal du pool retenu.
    pub max_weight: f64,
}

impl Sample {
    /// Poids qui alimente la confiance : celui de la sortie retenue en tête, sinon le maximum du pool.
    pub fn confidence_weight(&self) -> f64 {
        self.top_weight.unwrap_or(self.max_weight)
    }
}

/// Tirage pondéré sans remise sur les `pool_size` meilleurs candidats.
///
/// Un poids non positif est relevé à `floor` pour rester tirable.
/// Deux candidats bruts qui donnent la même chaîne formatée : seule la première est gardée,
/// sans tirage de remplacement, le résultat peut donc compter moins de `count` éléments.
pub fn sample(
    acc: &Accumulator,
    count: usize,
    width: DigitWidth,
    pool_size: usize,
    floor: f64,
    rng: &mut dyn RandomSource,
) -> Sample {
    let mut pool = acc.ranked();
    pool.truncate(pool_size);
    let max_weight = pool.first().map(|(_, w)| *w).unwrap_or(0.0);

    let mut numbers: Vec<String> = Vec::with_capacity(count);
    let mut top_weight = None;
    let mut draws = 0;

    while draws < count && !pool.is_empty() {
        draws += 1;
        let total: f64 = pool.iter().map(|(_, w)| w.max(floor)).sum();
        let mut r = rng.next_f64() * total;

        // Dernier élément par défaut : protège contre l'arrondi flottant
        let mut picked = pool.len() - 1;
        for (i, (_, w)) in pool.iter().enumerate() {
            r -= w.max(floor);
            if r <= 0.0 {
                picked = i;
                break;
            }
        }

        let (raw, weight) = pool.remove(picked);
        if top_weight.is_none() {
            top_weight = Some(weight);
        }
        let formatted = width.format(&raw);
        if !numbers.contains(&formatted) {
            numbers.push(formatted);
        }
    }

    if numbers.len() < count {
        debug!(requested = count, produced = numbers.len(), "pool épuisé ou doublons après formatage");
    }

    Sample { numbers, top_weight, max_weight }
}
