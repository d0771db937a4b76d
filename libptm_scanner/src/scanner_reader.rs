use fxhash::FxHashMap;

use super::chain::Chain;
use super::error::ReaderError;
use super::geometry::{ScannerGeometry, ScannerPlane};
use super::hit::{hits_from_frame, passes_filter, HitRecord};
use super::histogram::Hist1d;

/// The four wire-plane profiles of one aggregation pass over the scanner
/// ntuple, one histogram per signal plane.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub vert1: Hist1d,
    pub vert2: Hist1d,
    pub horiz1: Hist1d,
    pub horiz2: Hist1d,
}

impl ProfileSet {
    fn new(name_base: &str, geometry: &ScannerGeometry, y_label: &str) -> Self {
        let (low, high) = geometry.position_range();
        let n_bins = geometry.wires_per_plane as usize;
        let make = |suffix: &str, x_label: &str| {
            let mut hist = Hist1d::new(&format!("{name_base}{suffix}"), n_bins, low, high);
            hist.x_label = x_label.to_string();
            hist.y_label = y_label.to_string();
            hist
        };
        Self {
            vert1: make("vert1", "vert position (mm)"),
            vert2: make("vert2", "vert position (mm)"),
            horiz1: make("horiz1", "horiz position (mm)"),
            horiz2: make("horiz2", "horiz position (mm)"),
        }
    }

    fn hist_mut(&mut self, plane: ScannerPlane) -> &mut Hist1d {
        match plane {
            ScannerPlane::Vertical1 => &mut self.vert1,
            ScannerPlane::Vertical2 => &mut self.vert2,
            ScannerPlane::Horizontal1 => &mut self.horiz1,
            ScannerPlane::Horizontal2 => &mut self.horiz2,
        }
    }

    pub fn all(&self) -> [&Hist1d; 4] {
        [&self.horiz1, &self.horiz2, &self.vert1, &self.vert2]
    }
}

/// Aggregates hits from the PTM gas-volume sensitive detectors into
/// per-plane histograms.
#[derive(Debug, Clone, Default)]
pub struct ScannerReader {
    geometry: ScannerGeometry,
}

impl ScannerReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-standard geometry, e.g. a synthetic one in tests.
    pub fn with_geometry(geometry: ScannerGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ScannerGeometry {
        &self.geometry
    }

    /// Per-plane profiles of summed ionizing energy deposit vs wire position.
    pub fn ionizing_profiles(
        &self,
        chain: &Chain,
        name_base: &str,
        pdg_filter: Option<&[i64]>,
    ) -> Result<ProfileSet, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        Ok(self.fill_profiles(&hits, name_base, pdg_filter, true))
    }

    /// Per-plane profiles of hit counts vs wire position.
    pub fn hit_count_profiles(
        &self,
        chain: &Chain,
        name_base: &str,
        pdg_filter: Option<&[i64]>,
    ) -> Result<ProfileSet, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        Ok(self.fill_profiles(&hits, name_base, pdg_filter, false))
    }

    fn fill_profiles(
        &self,
        hits: &[HitRecord],
        name_base: &str,
        pdg_filter: Option<&[i64]>,
        weight_by_edep: bool,
    ) -> ProfileSet {
        let y_label = if weight_by_edep {
            "ionizing E dep (MeV)"
        } else {
            "count"
        };
        let mut profiles = ProfileSet::new(name_base, &self.geometry, y_label);
        for hit in hits {
            if !passes_filter(pdg_filter, hit.pdg_id) {
                continue;
            }
            // First matching volume-id range wins; unmatched hits dropped
            let Some(plane) = self.geometry.plane_for(hit.volume_id) else {
                continue;
            };
            let position = self.geometry.vol_id_to_position(hit.volume_id);
            let weight = if weight_by_edep { hit.ionizing_edep } else { 1.0 };
            profiles.hist_mut(plane).fill_weighted(position, weight);
        }
        profiles
    }

    /// Distribution of the total ionizing energy deposited by each unique
    /// particle inside a volume-id window.
    ///
    /// A particle is identified by (event, track, pdg, file ordinal); the
    /// file ordinal disambiguates event-id collisions between independently
    /// simulated files, so the chain is read file by file.
    pub fn ionizing_edep_hist(
        &self,
        chain: &Chain,
        vol_ids: (i64, i64),
        name: Option<&str>,
        pdg_filter: Option<&[i64]>,
        n_bins: usize,
        max_val: Option<f64>,
    ) -> Result<Hist1d, ReaderError> {
        let name = match name {
            Some(given) => given.to_string(),
            None => {
                let mut name = String::from("Ionizing E Dep");
                if let Some(ids) = pdg_filter {
                    name.push_str(&format!(" for pdgIds: {ids:?}"));
                }
                name
            }
        };

        let mut totals: FxHashMap<(i64, i64, i64, usize), f64> = FxHashMap::default();
        for (file_ordinal, df) in chain.collect_each()?.iter().enumerate() {
            for hit in hits_from_frame(df)? {
                if hit.volume_id < vol_ids.0 || hit.volume_id > vol_ids.1 {
                    continue;
                }
                if !passes_filter(pdg_filter, hit.pdg_id) {
                    continue;
                }
                *totals
                    .entry((hit.event_id, hit.track_id, hit.pdg_id, file_ordinal))
                    .or_insert(0.0) += hit.ionizing_edep;
            }
        }
        if totals.is_empty() {
            return Err(ReaderError::EmptyStream);
        }

        let data_max = totals.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let max = max_val.unwrap_or(data_max);
        let mut hist = Hist1d::new(&name, n_bins, 0.0, max);
        hist.x_label = String::from("ionizing E dep (MeV)");
        hist.y_label = String::from("count");
        for total in totals.values() {
            hist.fill(*total);
        }
        Ok(hist)
    }
}
