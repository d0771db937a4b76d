use fxhash::FxHashMap;

use super::hit::HitRecord;

/// Streaming kinetic-energy statistics for one particle species.
///
/// Accumulates count, sum, and sum of squares while scanning a hit stream;
/// mean and standard deviation are derived only after the stream is
/// exhausted, via variance = E[KE^2] - E[KE]^2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccountingRecord {
    pub count: u64,
    ke_sum: f64,
    ke_sqr_sum: f64,
}

impl AccountingRecord {
    pub fn add_sample(&mut self, kinetic_energy: f64) {
        self.count += 1;
        self.ke_sum += kinetic_energy;
        self.ke_sqr_sum += kinetic_energy * kinetic_energy;
    }

    pub fn ke_mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.ke_sum / self.count as f64
    }

    pub fn ke_stdev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.ke_mean();
        let variance = self.ke_sqr_sum / self.count as f64 - mean * mean;
        // A single sample, or rounding, can push the variance a hair below
        // zero; clamp before the square root
        variance.max(0.0).sqrt()
    }
}

/// Tally every hit in the stream by pdg id.
pub fn accumulate<'a>(hits: impl IntoIterator<Item = &'a HitRecord>) -> FxHashMap<i64, AccountingRecord> {
    let mut accounting: FxHashMap<i64, AccountingRecord> = FxHashMap::default();
    for hit in hits {
        accounting
            .entry(hit.pdg_id)
            .or_default()
            .add_sample(hit.kinetic_energy);
    }
    accounting
}
