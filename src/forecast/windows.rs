/// Sliding-window supervised samples.
///
/// Each sample flattens `window` consecutive rows (all columns, row by row)
/// into one feature vector; its label is the target column in the row right
/// after the window.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

/// Feature matrix `(samples, window * columns)` with one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl Samples {
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Self {
        debug_assert_eq!(features.nrows(), labels.len());
        Self { features, labels }
    }

    /// No samples, `width` features each.
    pub fn empty(width: usize) -> Self {
        Self::new(Array2::zeros((0, width)), Array1::zeros(0))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per sample.
    pub fn width(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.features.row(i)
    }

    pub fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    /// Splits at `at` without reordering: `[0, at)` and `[at, len)`.
    pub fn split_at(&self, at: usize) -> (Samples, Samples) {
        let at = at.min(self.len());
        let (train_x, test_x) = self.features.view().split_at(Axis(0), at);
        let (train_y, test_y) = self.labels.view().split_at(Axis(0), at);
        (
            Samples::new(train_x.to_owned(), train_y.to_owned()),
            Samples::new(test_x.to_owned(), test_y.to_owned()),
        )
    }
}

/// Flattens consecutive rows into one feature vector, row by row.
pub fn flatten_window(rows: ArrayView2<f64>) -> Array1<f64> {
    rows.iter().copied().collect()
}

/// Builds one sample per start index `i` in `[0, rows - window)`.
///
/// Yields no samples when there are `window` rows or fewer.
pub fn build_windows(values: ArrayView2<f64>, target_col: usize, window: usize) -> Samples {
    let (rows, columns) = values.dim();
    if window == 0 || rows <= window {
        return Samples::empty(columns * window);
    }

    let count = rows - window;
    let mut features = Array2::<f64>::zeros((count, columns * window));
    for (i, mut sample) in features.outer_iter_mut().enumerate() {
        sample.assign(&flatten_window(values.slice(s![i..i + window, ..])));
    }
    let labels = values.slice(s![window.., target_col]).to_owned();

    Samples::new(features, labels)
}

/// Chronological train/test boundary: `floor(n * train_fraction)`, but at
/// least one training sample whenever there is any sample.
pub fn split_index(n: usize, train_fraction: f64) -> usize {
    let at = (n as f64 * train_fraction).floor() as usize;
    at.clamp(n.min(1), n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 2), |(i, j)| i as f64 + 100.0 * j as f64)
    }

    #[test]
    fn test_windows_flatten_row_by_row() {
        let samples = build_windows(table(5).view(), 1, 2);

        assert_eq!(samples.len(), 3);
        assert_eq!(samples.width(), 4);
        assert_eq!(samples.row(0).to_vec(), vec![0.0, 100.0, 1.0, 101.0]);
        assert_eq!(samples.row(2).to_vec(), vec![2.0, 102.0, 3.0, 103.0]);
        // Label is the target column right after the window
        assert_eq!(samples.labels().to_vec(), vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn test_exactly_window_rows_yields_no_samples() {
        let empty = build_windows(table(3).view(), 0, 3);
        assert!(empty.is_empty());
        assert_eq!(empty.width(), 6);
        assert_eq!(build_windows(table(4).view(), 0, 3).len(), 1);
    }

    #[test]
    fn test_split_keeps_order() {
        let samples = build_windows(table(12).view(), 0, 2);
        let at = split_index(samples.len(), 0.8);
        assert_eq!(at, 8);

        let (train, test) = samples.split_at(at);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(train.label(7), 9.0);
        assert_eq!(test.label(0), 10.0);
        assert_eq!(test.row(1).to_vec(), samples.row(9).to_vec());
    }

    #[test]
    fn test_split_index_keeps_one_training_sample() {
        assert_eq!(split_index(0, 0.8), 0);
        assert_eq!(split_index(1, 0.8), 1);
        assert_eq!(split_index(2, 0.8), 1);
        assert_eq!(split_index(5, 0.8), 4);
    }
}
