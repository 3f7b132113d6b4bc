//! Small numeric helpers for working with downloaded grids.

/// Linear-interpolated quantile of an already-sorted slice. `q` is clamped
/// into [0, 1].
pub fn sorted_quantile(sorted: &[f32], q: f64) -> f32 {
    if sorted.is_empty() {
        return f32::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = (position - lower as f64) as f32;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Clip an array to lower and upper quantiles in place.
///
/// Quantiles are computed over the finite values only. NaN entries (nodata
/// that came through as NaN) pass through untouched; infinities are clamped
/// to the quantile bounds like any other value. `lower` and `upper` default
/// to 0 and 1, which leaves finite data unclipped. Crossed quantiles
/// (`lower > upper`) collapse the range to the upper quantile.
pub fn qclip(values: &mut [f32], lower: Option<f64>, upper: Option<f64>) {
    let lower = lower.unwrap_or(0.0);
    let upper = upper.unwrap_or(1.0);

    let mut finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut min_value = sorted_quantile(&finite, lower);
    let max_value = sorted_quantile(&finite, upper);
    if min_value > max_value {
        min_value = max_value;
    }
    for value in values.iter_mut() {
        // clamp leaves NaN alone
        *value = value.clamp(min_value, max_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_quantile() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(sorted_quantile(&data, 0.0), 0.0);
        assert_eq!(sorted_quantile(&data, 0.5), 2.0);
        assert_eq!(sorted_quantile(&data, 1.0), 4.0);
        assert_eq!(sorted_quantile(&data, 0.25), 1.0);
        assert!(sorted_quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_sorted_quantile_clamps_q() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(sorted_quantile(&data, 1.5), 4.0);
        assert_eq!(sorted_quantile(&data, -0.5), 0.0);
    }

    #[test]
    fn test_qclip() {
        let mut data: Vec<f32> = (0..=100).map(|v| v as f32).collect();
        qclip(&mut data, Some(0.1), Some(0.9));
        assert_eq!(data[0], 10.0);
        assert_eq!(data[100], 90.0);
        assert_eq!(data[50], 50.0);
    }

    #[test]
    fn test_qclip_defaults_leave_data_alone() {
        let mut data = vec![3.0f32, -1.0, 7.0];
        qclip(&mut data, None, None);
        assert_eq!(data, vec![3.0, -1.0, 7.0]);
    }

    #[test]
    fn test_qclip_crossed_quantiles_collapse() {
        let mut data = vec![1.0f32, 2.0, 3.0];
        qclip(&mut data, Some(0.9), Some(0.1));
        let upper = sorted_quantile(&[1.0, 2.0, 3.0], 0.1);
        assert!(data.iter().all(|&v| v == upper));
    }

    #[test]
    fn test_qclip_out_of_range_quantiles() {
        let mut data = vec![1.0f32, 2.0, 3.0];
        qclip(&mut data, Some(-2.0), Some(5.0));
        assert_eq!(data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_qclip_handles_non_finite() {
        let mut data = vec![f32::NAN, 0.0, 5.0, 10.0, f32::INFINITY];
        qclip(&mut data, Some(0.0), Some(0.5));
        assert!(data[0].is_nan());
        // Infinity is ignored for the quantile but clamped like any value
        assert_eq!(data[4], 5.0);
        assert_eq!(data[3], 5.0);
        assert_eq!(data[1], 0.0);
    }
}
