use num_traits::Float;

/// Arithmetic mean, zero for an empty input.
pub fn mean<T: Float>(values: &[T]) -> T {
    if values.is_empty() {
        return T::zero();
    }

    let n = T::from(values.len()).unwrap_or_else(T::one);
    values.iter().fold(T::zero(), |acc, &v| acc + v) / n
}

/// Sample standard deviation (n - 1 denominator).
///
/// Defined as zero for fewer than two values.
pub fn std_dev<T: Float>(values: &[T]) -> T {
    if values.len() < 2 {
        return T::zero();
    }

    let m = mean(values);
    let n1 = T::from(values.len() - 1).unwrap_or_else(T::one);
    let ss = values.iter().fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));

    (ss / n1).sqrt()
}

/// Share of `part` in `whole`, zero when `whole` is zero.
#[inline]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean::<f32>(&[]), 0.0);
    }

    #[test]
    fn std_of_single_value_is_zero() {
        assert_eq!(std_dev(&[4.2f32]), 0.0);
    }

    #[test]
    fn sample_std_dev() {
        let v = [2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert_eq!(mean(&v), 5.0);
        assert!((std_dev(&v) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn ratio_handles_empty_whole() {
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
