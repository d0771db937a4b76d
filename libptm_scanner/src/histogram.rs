use ndarray::Array2;

/// A 1D histogram with fixed-width bins over a fixed domain.
///
/// The bin count and domain bounds are set at creation and never change.
/// Fills outside the domain are silently clipped, matching the overflow
/// behavior of the usual HEP histogramming tools. Each bin carries a content
/// and an error value; errors are only populated by an explicit setter.
#[derive(Debug, Clone, PartialEq)]
pub struct Hist1d {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    min: f64,
    max: f64,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

impl Hist1d {
    pub fn new(name: &str, n_bins: usize, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            x_label: String::new(),
            y_label: String::new(),
            min,
            max,
            contents: vec![0.0; n_bins],
            errors: vec![0.0; n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.contents.len() as f64
    }

    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_width()
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.bin_low_edge(bin) + 0.5 * self.bin_width()
    }

    fn bin_index(&self, value: f64) -> Option<usize> {
        if value < self.min || value >= self.max {
            return None;
        }
        let idx = ((value - self.min) / self.bin_width()) as usize;
        Some(idx.min(self.contents.len() - 1))
    }

    pub fn fill(&mut self, value: f64) {
        self.fill_weighted(value, 1.0);
    }

    pub fn fill_weighted(&mut self, value: f64, weight: f64) {
        if let Some(idx) = self.bin_index(value) {
            self.contents[idx] += weight;
        }
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn set_bin_error(&mut self, bin: usize, error: f64) {
        if let Some(slot) = self.errors.get_mut(bin) {
            *slot = error;
        }
    }

    /// Multiply every bin content (and error) by a constant.
    pub fn scale(&mut self, factor: f64) {
        for value in self.contents.iter_mut() {
            *value *= factor;
        }
        for error in self.errors.iter_mut() {
            *error *= factor;
        }
    }

    pub fn sum(&self) -> f64 {
        self.contents.iter().sum()
    }

    pub fn max_content(&self) -> f64 {
        self.contents.iter().copied().fold(0.0, f64::max)
    }
}

/// A 2D histogram with fixed-width bins on both axes, backed by an ndarray
/// grid indexed as (x bin, y bin). Same fill and clipping semantics as
/// [`Hist1d`].
#[derive(Debug, Clone, PartialEq)]
pub struct Hist2d {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    counts: Array2<f64>,
}

impl Hist2d {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        n_x: usize,
        x_min: f64,
        x_max: f64,
        n_y: usize,
        y_min: f64,
        y_max: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            x_label: String::new(),
            y_label: String::new(),
            x_min,
            x_max,
            y_min,
            y_max,
            counts: Array2::zeros((n_x, n_y)),
        }
    }

    pub fn n_x(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_y(&self) -> usize {
        self.counts.ncols()
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn x_bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_x() as f64
    }

    pub fn y_bin_width(&self) -> f64 {
        (self.y_max - self.y_min) / self.n_y() as f64
    }

    pub fn x_low_edge(&self, bin: usize) -> f64 {
        self.x_min + bin as f64 * self.x_bin_width()
    }

    pub fn y_low_edge(&self, bin: usize) -> f64 {
        self.y_min + bin as f64 * self.y_bin_width()
    }

    fn bin_indices(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if x < self.x_min || x >= self.x_max || y < self.y_min || y >= self.y_max {
            return None;
        }
        let ix = (((x - self.x_min) / self.x_bin_width()) as usize).min(self.n_x() - 1);
        let iy = (((y - self.y_min) / self.y_bin_width()) as usize).min(self.n_y() - 1);
        Some((ix, iy))
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        if let Some((ix, iy)) = self.bin_indices(x, y) {
            self.counts[(ix, iy)] += weight;
        }
    }

    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    /// Every bin with nonzero content, as (x bin, y bin, content).
    pub fn nonzero_bins(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.counts
            .indexed_iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|((ix, iy), value)| (ix, iy, *value))
    }

    pub fn scale(&mut self, factor: f64) {
        self.counts.mapv_inplace(|value| value * factor);
    }

    pub fn sum(&self) -> f64 {
        self.counts.sum()
    }

    pub fn max_content(&self) -> f64 {
        self.counts.iter().copied().fold(0.0, f64::max)
    }

    /// Content-weighted mean along x, using bin centers.
    pub fn mean_x(&self) -> f64 {
        let total = self.sum();
        if total == 0.0 {
            return 0.0;
        }
        let mut weighted = 0.0;
        for (ix, _, value) in self.nonzero_bins() {
            weighted += (self.x_low_edge(ix) + 0.5 * self.x_bin_width()) * value;
        }
        weighted / total
    }

    /// Content-weighted mean along y, using bin centers.
    pub fn mean_y(&self) -> f64 {
        let total = self.sum();
        if total == 0.0 {
            return 0.0;
        }
        let mut weighted = 0.0;
        for (_, iy, value) in self.nonzero_bins() {
            weighted += (self.y_low_edge(iy) + 0.5 * self.y_bin_width()) * value;
        }
        weighted / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_clip_1d() {
        let mut hist = Hist1d::new("test", 48, -48.0, 48.0);
        assert_eq!(hist.n_bins(), 48);
        assert_eq!(hist.bin_width(), 2.0);

        hist.fill(-48.0); // first bin
        hist.fill(0.0);
        hist.fill_weighted(0.5, 3.0); // same bin as 0.0
        hist.fill(48.0); // at the upper edge: clipped
        hist.fill(100.0); // clipped
        hist.fill(-48.1); // clipped

        assert_eq!(hist.contents()[0], 1.0);
        assert_eq!(hist.contents()[24], 4.0);
        assert_eq!(hist.sum(), 5.0);
        assert_eq!(hist.n_bins(), 48); // clipped fills never resize
    }

    #[test]
    fn test_scale_and_errors_1d() {
        let mut hist = Hist1d::new("test", 4, 0.0, 4.0);
        for (bin, value) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            hist.fill_weighted(bin as f64 + 0.5, *value);
        }
        hist.scale(2.0);
        assert_eq!(hist.contents(), &[2.0, 4.0, 6.0, 8.0]);

        hist.set_bin_error(2, 0.25);
        assert_eq!(hist.errors()[2], 0.25);
        hist.set_bin_error(100, 1.0); // out of range: ignored
        assert_eq!(hist.errors().len(), 4);
    }

    #[test]
    fn test_fill_and_clip_2d() {
        let mut hist = Hist2d::new("test", 10, -5.0, 5.0, 10, -5.0, 5.0);
        hist.fill(0.0, 0.0);
        hist.fill(0.0, 0.0);
        hist.fill_weighted(-4.9, 4.9, 2.0);
        hist.fill(5.0, 0.0); // clipped
        hist.fill(0.0, -5.1); // clipped

        assert_eq!(hist.counts()[(5, 5)], 2.0);
        assert_eq!(hist.counts()[(0, 9)], 2.0);
        assert_eq!(hist.sum(), 4.0);
        assert_eq!(hist.max_content(), 2.0);
        assert_eq!(hist.nonzero_bins().count(), 2);
    }

    #[test]
    fn test_means_2d() {
        let mut hist = Hist2d::new("test", 10, 0.0, 10.0, 10, 0.0, 10.0);
        hist.fill(2.0, 4.0);
        hist.fill(4.0, 4.0);
        // bin centers are at x + 0.5
        assert!((hist.mean_x() - 3.5).abs() < 1e-12);
        assert!((hist.mean_y() - 4.5).abs() < 1e-12);
    }
}
