use polars::prelude::*;

use super::error::ReaderError;

// Branch names used by the simulation ntuples. These are fixed by the
// upstream readback modules, not by this crate.
pub const EVENT_COLUMN: &str = "evt";
pub const TRACK_COLUMN: &str = "trk";
pub const PDG_COLUMN: &str = "pdg";
pub const VOLUME_COLUMN: &str = "volId";
pub const X_COLUMN: &str = "xl";
pub const Y_COLUMN: &str = "yl";
pub const Z_COLUMN: &str = "zl";
pub const KE_COLUMN: &str = "ke";
pub const IEDEP_COLUMN: &str = "iedep";

/// One simulation hit, decoded from the columnar source. Positions are local
/// detector coordinates in mm, energies are in MeV.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub event_id: i64,
    pub track_id: i64,
    pub pdg_id: i64,
    pub volume_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub kinetic_energy: f64,
    pub ionizing_edep: f64,
}

/// Evaluate an optional allow-list. None means no filter at all, which is
/// distinct from an empty list (which matches nothing).
pub fn passes_filter(filter: Option<&[i64]>, value: i64) -> bool {
    match filter {
        None => true,
        Some(allowed) => allowed.contains(&value),
    }
}

fn int_column(df: &DataFrame, name: &'static str) -> Result<Vec<i64>, ReaderError> {
    let series = df.column(name)?.cast(&DataType::Int64)?;
    let values = series.i64()?;
    if values.null_count() != 0 {
        return Err(ReaderError::NullColumn(name));
    }
    Ok(values.into_no_null_iter().collect())
}

fn float_column(df: &DataFrame, name: &'static str) -> Result<Vec<f64>, ReaderError> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?;
    if values.null_count() != 0 {
        return Err(ReaderError::NullColumn(name));
    }
    Ok(values.into_no_null_iter().collect())
}

/// Decode a full data frame into hit records.
///
/// Integer branches are cast to i64 and real branches to f64, so the exact
/// on-disk width does not matter. Null entries in any branch are an error.
pub fn hits_from_frame(df: &DataFrame) -> Result<Vec<HitRecord>, ReaderError> {
    let events = int_column(df, EVENT_COLUMN)?;
    let tracks = int_column(df, TRACK_COLUMN)?;
    let pdgs = int_column(df, PDG_COLUMN)?;
    let volumes = int_column(df, VOLUME_COLUMN)?;
    let xs = float_column(df, X_COLUMN)?;
    let ys = float_column(df, Y_COLUMN)?;
    let zs = float_column(df, Z_COLUMN)?;
    let kes = float_column(df, KE_COLUMN)?;
    let iedeps = float_column(df, IEDEP_COLUMN)?;

    let mut hits = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        hits.push(HitRecord {
            event_id: events[idx],
            track_id: tracks[idx],
            pdg_id: pdgs[idx],
            volume_id: volumes[idx],
            x: xs[idx],
            y: ys[idx],
            z: zs[idx],
            kinetic_energy: kes[idx],
            ionizing_edep: iedeps[idx],
        });
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_frame() -> DataFrame {
        df!(
            EVENT_COLUMN => &[1i64, 1, 2],
            TRACK_COLUMN => &[1i64, 2, 1],
            PDG_COLUMN => &[2212i64, 11, 2212],
            VOLUME_COLUMN => &[0i64, 48, 191],
            X_COLUMN => &[0.5f64, -1.0, 3.25],
            Y_COLUMN => &[0.0f64, 2.0, -4.5],
            Z_COLUMN => &[10.0f64, 10.0, 10.0],
            KE_COLUMN => &[8000.0f64, 12.5, 7900.0],
            IEDEP_COLUMN => &[0.002f64, 0.0001, 0.0015],
        )
        .unwrap()
    }

    #[test]
    fn test_hits_from_frame() {
        let df = sample_frame();
        let hits = hits_from_frame(&df).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].event_id, 1);
        assert_eq!(hits[1].pdg_id, 11);
        assert_eq!(hits[2].volume_id, 191);
        assert_eq!(hits[2].x, 3.25);
        assert_eq!(hits[0].kinetic_energy, 8000.0);
        assert_eq!(hits[1].ionizing_edep, 0.0001);
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df!(EVENT_COLUMN => &[1i64]).unwrap();
        assert!(hits_from_frame(&df).is_err());
    }

    #[test]
    fn test_filter_semantics() {
        assert!(passes_filter(None, 2212));
        assert!(passes_filter(Some(&[2212, 11]), 2212));
        assert!(!passes_filter(Some(&[2212, 11]), 13));
        // An empty allow-list matches nothing; it is not "no filter"
        assert!(!passes_filter(Some(&[]), 2212));
    }
}
