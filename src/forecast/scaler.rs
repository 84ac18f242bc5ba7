/// Per-column standardization (zero mean, unit variance).
///
/// Statistics use the population variance (`ddof = 0`). A constant column
/// keeps a scale of 1.0, so it standardizes to all zeros instead of
/// dividing by zero.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl StandardScaler {
    /// Fits one mean/scale pair per column of `values`.
    ///
    /// Returns `None` for an empty table.
    pub fn fit(values: ArrayView2<f64>) -> Option<Self> {
        if values.nrows() == 0 {
            return None;
        }

        let means = values.mean_axis(Axis(0))?;
        let scales = values
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std > 0.0 { std } else { 1.0 });

        Some(Self { means, scales })
    }

    /// Fits a single-column scaler.
    pub fn fit_column(values: ArrayView1<f64>) -> Option<Self> {
        Self::fit(values.insert_axis(Axis(1)))
    }

    pub fn means(&self) -> ArrayView1<'_, f64> {
        self.means.view()
    }

    pub fn scales(&self) -> ArrayView1<'_, f64> {
        self.scales.view()
    }

    /// Standardizes every column; `values` must have the fitted width.
    pub fn transform(&self, values: ArrayView2<f64>) -> Array2<f64> {
        (&values - &self.means) / &self.scales
    }

    /// Maps a standardized value of column `col` back to physical units.
    pub fn inverse(&self, col: usize, value: f64) -> f64 {
        value * self.scales[col] + self.means[col]
    }
}
