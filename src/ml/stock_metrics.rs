/// Percentile of the upper band used as the stock recommendation.
pub const RECOMMENDED_STOCK_PERCENTILE: f64 = 95.0;

/// Rounds half to even at the given number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Rounds the exact binary value of `value` to the nearest decimal.
///
/// Unlike [`round_to`] the value is not scaled first, so `56.45` (stored as
/// `56.4500000000000028...`) becomes `56.5`. Used for the scalar metrics.
pub fn round_decimal(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

pub fn round_all(values: &[f64], decimals: u32) -> Vec<f64> {
    values.iter().map(|&v| round_to(v, decimals)).collect()
}

/// Percentage change from the last historical level to the end of the forecast.
///
/// A zero starting level is defined as zero growth.
pub fn growth_rate(last_historical: f64, last_forecast: f64) -> f64 {
    if last_historical == 0.0 {
        return 0.0;
    }
    (last_forecast - last_historical) / last_historical * 100.0
}

/// Linearly interpolated percentile (`pct` in `[0, 100]`) of `values`.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Stock level suggested by the upper forecast band, truncated toward zero.
pub fn recommended_stock(upper_bound: &[f64]) -> i64 {
    percentile(upper_bound, RECOMMENDED_STOCK_PERCENTILE)
        .map(|p| p.trunc() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2.675, 2, 2.68)]
    #[case(2.5, 0, 2.0)]
    #[case(0.625, 2, 0.62)]
    #[case(0.125, 2, 0.12)]
    #[case(0.375, 2, 0.38)]
    #[case(-1.25, 1, -1.2)]
    #[case(12.0, 1, 12.0)]
    fn rounds_half_to_even(#[case] value: f64, #[case] decimals: u32, #[case] expected: f64) {
        assert_eq!(round_to(value, decimals), expected);
    }

    #[rstest]
    #[case(56.45, 1, 56.5)]
    #[case(2.675, 2, 2.67)]
    #[case(33.333, 1, 33.3)]
    #[case(-12.35, 1, -12.3)]
    #[case(87.0, 1, 87.0)]
    fn rounds_the_exact_decimal_value(
        #[case] value: f64,
        #[case] decimals: usize,
        #[case] expected: f64,
    ) {
        assert_eq!(round_decimal(value, decimals), expected);
    }

    #[test]
    fn scaled_and_exact_rounding_differ_above_a_hidden_tie() {
        assert_eq!(round_to(56.45, 1), 56.4);
        assert_eq!(round_decimal(56.45, 1), 56.5);
    }

    #[test]
    fn exact_rounding_keeps_non_finite_values() {
        assert!(round_decimal(f64::NAN, 1).is_nan());
        assert_eq!(round_decimal(f64::INFINITY, 1), f64::INFINITY);
    }

    #[test]
    fn zero_base_means_zero_growth() {
        assert_eq!(growth_rate(0.0, 500.0), 0.0);
        assert_eq!(growth_rate(0.0, -3.0), 0.0);
    }

    #[test]
    fn growth_is_relative_to_last_level() {
        assert_eq!(growth_rate(50.0, 75.0), 50.0);
        assert_eq!(growth_rate(-20.0, -10.0), -50.0);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values: Vec<f64> = (0..91).map(|v| v as f64).collect();
        // rank 0.95 * 90 = 85.5
        assert_eq!(percentile(&values, 95.0), Some(85.5));
        assert_eq!(percentile(&values, 0.0), Some(0.0));
        assert_eq!(percentile(&values, 100.0), Some(90.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn recommended_stock_truncates_the_95th_percentile() {
        let upper: Vec<f64> = (0..91).map(|v| 100.0 + v as f64 * 2.0).collect();
        // 100 + 85.5 * 2 = 271
        assert_eq!(recommended_stock(&upper), 271);

        let shifted: Vec<f64> = upper.iter().map(|v| v + 0.99).collect();
        assert_eq!(recommended_stock(&shifted), 271);
    }

    #[test]
    fn recommended_stock_truncates_toward_zero_for_negative_levels() {
        let upper = vec![-10.7; 91];
        assert_eq!(recommended_stock(&upper), -10);
    }

    #[test]
    fn percentile_ignores_input_order() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
    }
}
