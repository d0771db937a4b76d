//! Constants shared across the scanner pipeline.

/// Number of sense wires in one PWC signal plane.
pub const WIRES_PER_PLANE: i64 = 48;

/// Spacing between neighboring sense wires, in mm.
pub const WIRE_SPACING_MM: f64 = 2.0;

/// Default energy-deposit-to-voltage conversion. Scaled so 1e6 protons in a
/// narrow peak (missing the target) gets a signal peak height of 9.5 V.
pub const DEFAULT_SIGNAL_CONVERSION: f64 = 0.01759;

/// Default error on the TOTAL integrated signal in one detector plane. This
/// is distributed evenly over all the wires in the plane.
pub const DEFAULT_TOTAL_SIGNAL_ERR: f64 = 0.05;

/// Simulation output files are named in the form nts.otherStuffHere.parquet
pub const NTUPLE_PREFIX: &str = "nts.";
pub const NTUPLE_SUFFIX: &str = ".parquet";

/// Extension of the rendered vector-graphics plot files.
pub const PLOT_EXTENSION: &str = "svg";
