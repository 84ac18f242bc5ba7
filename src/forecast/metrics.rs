/// Error metrics over paired (actual, predicted) values.

use ndarray::ArrayView1;

/// Root mean squared error. `None` for empty or mismatched inputs.
pub fn rmse(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Option<f64> {
    if actual.len() != predicted.len() {
        return None;
    }
    let errors = &actual - &predicted;
    errors.mapv(|e| e * e).mean().map(f64::sqrt)
}

/// Mean absolute error. `None` for empty or mismatched inputs.
pub fn mae(actual: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Option<f64> {
    if actual.len() != predicted.len() {
        return None;
    }
    let errors = &actual - &predicted;
    errors.mapv(f64::abs).mean()
}
