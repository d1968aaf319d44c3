//! Regression metrics.

/// Coefficient of determination.
///
/// A constant target scores 1 when every prediction matches it and 0
/// otherwise. Empty or mismatched inputs score 0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Root mean squared error.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Mean absolute error.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_r2() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(r2_score(&actual, &actual), 1.0);
        assert_relative_eq!(r2_score(&actual, &[2.5; 4]), 0.0);
        assert_relative_eq!(r2_score(&actual, &[1.0, 2.0, 3.0, 5.0]), 1.0 - 1.0 / 5.0);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_relative_eq!(r2_score(&[3.0; 3], &[3.0; 3]), 1.0);
        assert_relative_eq!(r2_score(&[3.0; 3], &[3.0, 3.0, 4.0]), 0.0);
        assert_relative_eq!(r2_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_errors() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [2.0, 2.0, 3.0, 2.0];
        assert_relative_eq!(mae(&actual, &predicted), 0.75);
        assert_relative_eq!(rmse(&actual, &predicted), (5.0f64 / 4.0).sqrt());
        assert_relative_eq!(rmse(&actual, &actual), 0.0);
    }
}
