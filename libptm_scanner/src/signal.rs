use super::histogram::Hist1d;

/// Convert a finished ionizing-energy profile into a synthetic scanner
/// voltage signal by scaling every bin by the conversion constant.
pub fn derive_signal(profile: &Hist1d, conversion_const: f64, name: &str) -> Hist1d {
    let mut signal = profile.clone();
    signal.name = name.to_string();
    signal.y_label = String::from("scanner signal (V)");
    signal.scale(conversion_const);
    signal
}

/// Distribute the total-signal uncertainty evenly over the bins of a signal
/// histogram.
///
/// The per-bin error is (total error fraction x signal sum) / sqrt(wires per
/// plane): the wires of one plane share a single read-out channel, so every
/// bin receives the same absolute error rather than a per-bin statistical
/// one. Returns the diagnostic total error fraction, the quadrature sum of
/// the injected errors divided by the signal sum.
pub fn distribute_bin_errors(hist: &mut Hist1d, total_err_frac: f64, wires_per_plane: i64) -> f64 {
    let bin_sum = hist.sum();
    if bin_sum <= 0.0 {
        log::warn!(
            "Signal histogram {} is empty; no bin errors to distribute",
            hist.name
        );
        return 0.0;
    }
    let bin_err = total_err_frac * bin_sum / (wires_per_plane as f64).sqrt();
    log::debug!("Bin err: {bin_err:.4} V");
    let mut err_sqr_sum = 0.0;
    for bin in 0..hist.n_bins() {
        hist.set_bin_error(bin, bin_err);
        err_sqr_sum += bin_err * bin_err;
    }
    let total_err_frac = err_sqr_sum.sqrt() / bin_sum;
    log::debug!("Hist sum error frac: {total_err_frac:.4}");
    total_err_frac
}
