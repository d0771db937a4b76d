use fxhash::FxHashMap;

use super::accounting::{accumulate, AccountingRecord};
use super::chain::Chain;
use super::error::ReaderError;
use super::geometry::FrameTransform;
use super::hit::{hits_from_frame, passes_filter, HitRecord};
use super::histogram::{Hist1d, Hist2d};

/// Fraction of the data span added on each side when a histogram range is
/// derived from the data itself.
const RANGE_PADDING: f64 = 0.025;

/// Makes histograms from virtual-detector hit streams.
///
/// By default the 2D position ranges are derived from the data with a little
/// padding; the [`VirtDetReader::ptm`] variant pins them to the PTM
/// aperture instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtDetReader {
    fixed_range: Option<((f64, f64), (f64, f64))>,
}

impl VirtDetReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader for the PTM virtual detectors: position ranges fixed to
    /// +-48 mm regardless of where the data lands.
    pub fn ptm() -> Self {
        Self {
            fixed_range: Some(((-48.0, 48.0), (-48.0, 48.0))),
        }
    }

    fn axis_ends(values: &[f64]) -> Result<(f64, f64), ReaderError> {
        if values.is_empty() {
            // Deriving a range from no data is undefined; report it rather
            // than crash downstream
            return Err(ReaderError::EmptyStream);
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        Ok((min - RANGE_PADDING * span, max + RANGE_PADDING * span))
    }

    fn x_ends(&self, values: &[f64]) -> Result<(f64, f64), ReaderError> {
        match self.fixed_range {
            Some((x_range, _)) => Ok(x_range),
            None => Self::axis_ends(values),
        }
    }

    fn y_ends(&self, values: &[f64]) -> Result<(f64, f64), ReaderError> {
        match self.fixed_range {
            Some((_, y_range)) => Ok(y_range),
            None => Self::axis_ends(values),
        }
    }

    /// 2D occupancy of hit positions on the detector plane.
    pub fn position_hist(
        &self,
        chain: &Chain,
        name: &str,
        pdg_filter: Option<&[i64]>,
        track_filter: Option<&[i64]>,
        bins_per_side: usize,
        transform: Option<&FrameTransform>,
    ) -> Result<Hist2d, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        self.position_hist_from_hits(&hits, name, pdg_filter, track_filter, bins_per_side, transform)
    }

    pub(crate) fn position_hist_from_hits(
        &self,
        hits: &[HitRecord],
        name: &str,
        pdg_filter: Option<&[i64]>,
        track_filter: Option<&[i64]>,
        bins_per_side: usize,
        transform: Option<&FrameTransform>,
    ) -> Result<Hist2d, ReaderError> {
        let positions = Self::transformed_positions(hits, pdg_filter, track_filter, transform);
        self.fill_position_hist(name, bins_per_side, &positions, None)
    }

    /// 2D position occupancy where each fill is weighted by the particle's
    /// kinetic energy.
    pub fn ke_weighted_position_hist(
        &self,
        chain: &Chain,
        name: &str,
        pdg_filter: Option<&[i64]>,
        bins_per_side: usize,
        transform: Option<&FrameTransform>,
    ) -> Result<Hist2d, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        let positions = Self::transformed_positions(&hits, pdg_filter, None, transform);
        let weights: Vec<f64> = hits
            .iter()
            .filter(|hit| passes_filter(pdg_filter, hit.pdg_id))
            .map(|hit| hit.kinetic_energy)
            .collect();
        self.fill_position_hist(name, bins_per_side, &positions, Some(&weights))
    }

    fn transformed_positions(
        hits: &[HitRecord],
        pdg_filter: Option<&[i64]>,
        track_filter: Option<&[i64]>,
        transform: Option<&FrameTransform>,
    ) -> Vec<(f64, f64)> {
        let mut positions = Vec::new();
        for hit in hits {
            if !passes_filter(pdg_filter, hit.pdg_id) {
                continue;
            }
            if !passes_filter(track_filter, hit.track_id) {
                continue;
            }
            let (x, y, _z) = match transform {
                Some(transform) => transform.apply(hit.x, hit.y, hit.z),
                None => (hit.x, hit.y, hit.z),
            };
            positions.push((x, y));
        }
        positions
    }

    fn fill_position_hist(
        &self,
        name: &str,
        bins_per_side: usize,
        positions: &[(f64, f64)],
        weights: Option<&[f64]>,
    ) -> Result<Hist2d, ReaderError> {
        let xs: Vec<f64> = positions.iter().map(|(x, _)| *x).collect();
        let ys: Vec<f64> = positions.iter().map(|(_, y)| *y).collect();
        let (x_min, x_max) = self.x_ends(&xs)?;
        let (y_min, y_max) = self.y_ends(&ys)?;
        let mut hist = Hist2d::new(name, bins_per_side, x_min, x_max, bins_per_side, y_min, y_max);
        hist.x_label = String::from("x position (mm)");
        hist.y_label = String::from("y position (mm)");
        match weights {
            Some(weights) => {
                for ((x, y), weight) in positions.iter().zip(weights) {
                    hist.fill_weighted(*x, *y, *weight);
                }
            }
            None => {
                for (x, y) in positions {
                    hist.fill(*x, *y);
                }
            }
        }
        Ok(hist)
    }

    /// Spectrum of incident kinetic energy, ranged 0 to the data maximum.
    pub fn incident_ke_hist(
        &self,
        chain: &Chain,
        name: &str,
        pdg_filter: Option<&[i64]>,
        n_bins: usize,
    ) -> Result<Hist1d, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        let kes: Vec<f64> = hits
            .iter()
            .filter(|hit| passes_filter(pdg_filter, hit.pdg_id))
            .map(|hit| hit.kinetic_energy)
            .collect();
        if kes.is_empty() {
            return Err(ReaderError::EmptyStream);
        }
        let max = kes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut hist = Hist1d::new(name, n_bins, 0.0, max);
        hist.x_label = String::from("incident KE (MeV)");
        hist.y_label = String::from("count");
        for ke in kes {
            hist.fill(ke);
        }
        Ok(hist)
    }

    /// Count every hit passing the filter.
    pub fn total_particle_count(
        &self,
        chain: &Chain,
        pdg_filter: Option<&[i64]>,
    ) -> Result<u64, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        Ok(hits
            .iter()
            .filter(|hit| passes_filter(pdg_filter, hit.pdg_id))
            .count() as u64)
    }

    /// Per-species count and kinetic-energy statistics for the whole stream.
    pub fn particle_accounting(
        &self,
        chain: &Chain,
    ) -> Result<FxHashMap<i64, AccountingRecord>, ReaderError> {
        let df = chain.collect()?;
        let hits = hits_from_frame(&df)?;
        Ok(accumulate(&hits))
    }
}
