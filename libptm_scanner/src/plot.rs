use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::error::PlotError;
use super::histogram::{Hist1d, Hist2d};

const PLOT_SIZE: (u32, u32) = (800, 600);

/// Render a 1D histogram to a vector-graphics file, optionally with the
/// per-bin error bars drawn on top.
pub fn render_hist1d(hist: &Hist1d, path: &Path, error_bars: bool) -> Result<(), PlotError> {
    draw_hist1d(hist, path, error_bars)
        .map_err(|e| PlotError::Render(hist.name.clone(), e.to_string()))
}

/// Render a 2D histogram to a vector-graphics file as a color map.
pub fn render_hist2d(hist: &Hist2d, path: &Path) -> Result<(), PlotError> {
    draw_hist2d(hist, path).map_err(|e| PlotError::Render(hist.name.clone(), e.to_string()))
}

fn step_outline(hist: &Hist1d) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(2 * hist.n_bins());
    for (bin, value) in hist.contents().iter().enumerate() {
        points.push((hist.bin_low_edge(bin), *value));
        points.push((hist.bin_low_edge(bin) + hist.bin_width(), *value));
    }
    points
}

fn draw_hist1d(hist: &Hist1d, path: &Path, error_bars: bool) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut y_max = hist
        .contents()
        .iter()
        .zip(hist.errors())
        .map(|(value, error)| value + error)
        .fold(0.0_f64, f64::max);
    if y_max <= 0.0 {
        y_max = 1.0;
    }
    y_max *= 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(&hist.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(hist.min()..hist.max(), 0.0..y_max)?;
    chart
        .configure_mesh()
        .x_desc(hist.x_label.as_str())
        .y_desc(hist.y_label.as_str())
        .draw()?;

    chart.draw_series((0..hist.n_bins()).map(|bin| {
        let low = hist.bin_low_edge(bin);
        Rectangle::new(
            [(low, 0.0), (low + hist.bin_width(), hist.contents()[bin])],
            BLUE.mix(0.35).filled(),
        )
    }))?;
    chart.draw_series(std::iter::once(PathElement::new(step_outline(hist), &BLUE)))?;

    if error_bars {
        chart.draw_series((0..hist.n_bins()).map(|bin| {
            let value = hist.contents()[bin];
            let error = hist.errors()[bin];
            ErrorBar::new_vertical(
                hist.bin_center(bin),
                (value - error).max(0.0),
                value,
                value + error,
                BLACK.filled(),
                6,
            )
        }))?;
    }

    root.present()?;
    Ok(())
}

fn draw_hist2d(hist: &Hist2d, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&hist.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(hist.x_min()..hist.x_max(), hist.y_min()..hist.y_max())?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(hist.x_label.as_str())
        .y_desc(hist.y_label.as_str())
        .draw()?;

    let max_content = hist.max_content();
    if max_content > 0.0 {
        chart.draw_series(hist.nonzero_bins().map(|(ix, iy, value)| {
            let x_low = hist.x_low_edge(ix);
            let y_low = hist.y_low_edge(iy);
            let frac = value / max_content;
            // Rainbow-ish map, cold to hot
            let color = HSLColor(0.66 * (1.0 - frac), 0.9, 0.45);
            Rectangle::new(
                [
                    (x_low, y_low),
                    (x_low + hist.x_bin_width(), y_low + hist.y_bin_width()),
                ],
                color.filled(),
            )
        }))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_hist1d() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.svg");
        let mut hist = Hist1d::new("test hist", 48, -48.0, 48.0);
        hist.fill_weighted(0.0, 3.0);
        hist.set_bin_error(24, 0.5);
        render_hist1d(&hist, &path, true).unwrap();
        let rendered = std::fs::read_to_string(&path).unwrap();
        assert!(rendered.contains("<svg"));
    }

    #[test]
    fn test_render_hist2d() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist2d.svg");
        let mut hist = Hist2d::new("test hist 2d", 50, -48.0, 48.0, 50, -48.0, 48.0);
        hist.fill(0.0, 0.0);
        hist.fill(10.0, -4.0);
        render_hist2d(&hist, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_empty_hist_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        let hist = Hist1d::new("empty", 10, 0.0, 1.0);
        render_hist1d(&hist, &path, false).unwrap();
        assert!(path.exists());
    }
}
