use super::types::PercentilePathPoint;

const AXIS_PADDING: f64 = 1.1;

// Rounds the padded best-case peak up to 1, 2, 5 or 10 times its order of magnitude.
pub fn y_axis_max(paths: &[PercentilePathPoint]) -> f64 {
    let peak = paths
        .iter()
        .map(|p| p.best)
        .fold(f64::NEG_INFINITY, f64::max);
    let padded = peak * AXIS_PADDING;
    if !padded.is_finite() || padded <= 0.0 {
        return 0.0;
    }

    let order_of_magnitude = 10_f64.powi(padded.log10().floor() as i32);
    let normalized = padded / order_of_magnitude;

    let multiplier = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    multiplier * order_of_magnitude
}
