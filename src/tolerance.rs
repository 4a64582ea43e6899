// Float comparison helpers

use crate::error::DropRateSearchError;

pub const DEFAULT_REL_TOL: f64 = 1e-9;
pub const DEFAULT_ABS_TOL: f64 = 0.0;

/// Close equality of two floats.
///
/// True when `a == b`, otherwise when
/// `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)`.
/// Both tolerances must be non-negative.
pub fn floats_are_close_equal(
    a: f64,
    b: f64,
    rel_tol: f64,
    abs_tol: f64,
) -> Result<bool, DropRateSearchError> {
    if rel_tol.is_nan() || abs_tol.is_nan() || rel_tol < 0.0 || abs_tol < 0.0 {
        return Err(DropRateSearchError::ConfigError(
            "Error tolerances must be non-negative".to_string(),
        ));
    }
    if a == b {
        return Ok(true);
    }
    Ok((b - a).abs() <= (rel_tol * a.abs().max(b.abs())).max(abs_tol))
}

/// [`floats_are_close_equal`] with the default tolerances.
pub fn floats_are_close(a: f64, b: f64) -> bool {
    floats_are_close_equal(a, b, DEFAULT_REL_TOL, DEFAULT_ABS_TOL).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_equality() {
        assert!(floats_are_close_equal(100.0, 100.0, DEFAULT_REL_TOL, DEFAULT_ABS_TOL).unwrap());
        assert!(floats_are_close_equal(f64::INFINITY, f64::INFINITY, 0.0, 0.0).unwrap());
    }

    #[test]
    fn relative_tolerance_scales_with_magnitude() {
        assert!(floats_are_close(1e9, 1e9 + 0.5));
        assert!(!floats_are_close(1.0, 1.0 + 1e-6));
    }

    #[test]
    fn accumulated_step_error_is_close() {
        let mut rate = 0.0;
        for _ in 0..10 {
            rate += 0.1;
        }
        assert_ne!(rate, 1.0);
        assert!(floats_are_close(rate, 1.0));
    }

    #[test]
    fn absolute_tolerance_applies_near_zero() {
        assert!(!floats_are_close_equal(0.0, 1e-12, DEFAULT_REL_TOL, 0.0).unwrap());
        assert!(floats_are_close_equal(0.0, 1e-12, DEFAULT_REL_TOL, 1e-9).unwrap());
    }

    #[test]
    fn negative_tolerances_rejected() {
        assert!(floats_are_close_equal(1.0, 2.0, -1e-9, 0.0).is_err());
        assert!(floats_are_close_equal(1.0, 2.0, 1e-9, -0.1).is_err());
        assert!(floats_are_close_equal(1.0, 1.0, -1.0, 0.0).is_err());
    }

    #[test]
    fn default_helper_follows_checked_variant_on_edge_values() {
        let cases = [
            (f64::INFINITY, f64::INFINITY),
            (f64::INFINITY, f64::NEG_INFINITY),
            (0.0, -0.0),
            (f64::NAN, 1.0),
            (100.0, 100.0 + 1e-7),
        ];
        for (a, b) in cases {
            assert_eq!(
                floats_are_close(a, b),
                floats_are_close_equal(a, b, DEFAULT_REL_TOL, DEFAULT_ABS_TOL).unwrap()
            );
        }
    }

    #[test]
    fn nan_is_never_close() {
        assert!(!floats_are_close(f64::NAN, f64::NAN));
        assert!(!floats_are_close(f64::NAN, 1.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_symmetric(
            a in -1e12f64..1e12,
            b in -1e12f64..1e12,
            rel in 0.0f64..1e-3,
            abs in 0.0f64..1.0,
        ) {
            prop_assert_eq!(
                floats_are_close_equal(a, b, rel, abs).unwrap(),
                floats_are_close_equal(b, a, rel, abs).unwrap()
            );
        }

        #[test]
        fn prop_reflexive(a in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            prop_assert!(floats_are_close(a, a));
        }

        #[test]
        fn prop_default_helper_matches_checked_variant(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            prop_assert_eq!(
                floats_are_close(a, b),
                floats_are_close_equal(a, b, DEFAULT_REL_TOL, DEFAULT_ABS_TOL).unwrap()
            );
        }
    }
}
