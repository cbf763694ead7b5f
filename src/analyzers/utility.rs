/// Average of the readings, or `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    let count = values.len();
    (count > 0).then(|| values.iter().sum::<f64>() / count as f64)
}

/// Computes the sample variance (n - 1 denominator) given a pre-computed mean.
/// Returns 0.0 when fewer than two values are present.
pub fn sample_variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[-70.0, -80.0, -75.0]), Some(-75.0));
    }

    #[test]
    fn test_sample_variance() {
        let values = [2.0, 4.0, 6.0, 8.0];
        // squared deviations sum to 20, over n - 1 = 3
        assert!((sample_variance(&values, mean(&values).unwrap()) - 20.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_variance_identical_values() {
        let values = [-75.0; 6];
        assert_eq!(sample_variance(&values, mean(&values).unwrap()), 0.0);
    }

    #[test]
    fn test_sample_variance_single_value() {
        assert_eq!(sample_variance(&[-101.0], -101.0), 0.0);
    }
}
