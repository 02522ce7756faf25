//! Distance metric parameterization.
//!
//! One 2-scalar block covers the whole Minkowski/Chebyshev family:
//! `d(dx, dy) = (1-c) * (|dx|^p + |dy|^p)^(1/p) + c * max(|dx|, |dy|)`
//! with `p = 2^minkowski`. The metric is evaluated through a single helper
//! so the heap key stays monotone for any exponent.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

/// Distance metric parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceParams {
    /// Exponent control in `[-10, 10]`; the Minkowski exponent is `2^minkowski`.
    pub minkowski: f32,
    /// Blend toward pure Chebyshev distance, in `[0, 1]`.
    pub chebyshev: f32,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self::EUCLIDEAN
    }
}

impl DistanceParams {
    /// Euclidean distance: `p = 2^1 = 2`, no Chebyshev blend.
    pub const EUCLIDEAN: DistanceParams = DistanceParams {
        minkowski: 1.0,
        chebyshev: 0.0,
    };

    pub fn new(minkowski: f32, chebyshev: f32) -> Self {
        Self {
            minkowski,
            chebyshev,
        }
    }

    /// Range-check both parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.minkowski.is_finite() || !(-10.0..=10.0).contains(&self.minkowski) {
            return Err(Error::InvalidArgument(format!(
                "minkowski {} outside [-10, 10]",
                self.minkowski
            )));
        }
        if !self.chebyshev.is_finite() || !(0.0..=1.0).contains(&self.chebyshev) {
            return Err(Error::InvalidArgument(format!(
                "chebyshev {} outside [0, 1]",
                self.chebyshev
            )));
        }
        Ok(())
    }

    /// Metric distance for a displacement. Only magnitudes matter.
    pub fn distance(&self, dx: i32, dy: i32) -> f32 {
        let ax = dx.abs() as f32;
        let ay = dy.abs() as f32;
        if ax == 0.0 && ay == 0.0 {
            return 0.0;
        }

        let p = self.minkowski.exp2();
        let minkowski = (ax.powf(p) + ay.powf(p)).powf(1.0 / p);
        let chebyshev = ax.max(ay);

        (1.0 - self.chebyshev) * minkowski + self.chebyshev * chebyshev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean() {
        let m = DistanceParams::EUCLIDEAN;
        assert!((m.distance(3, 4) - 5.0).abs() < 1e-5);
        assert!((m.distance(1, 0) - 1.0).abs() < 1e-6);
        assert_eq!(m.distance(0, 0), 0.0);
    }

    #[test]
    fn test_manhattan() {
        // p = 2^0 = 1
        let m = DistanceParams::new(0.0, 0.0);
        assert!((m.distance(3, 4) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_chebyshev_blend() {
        let m = DistanceParams::new(1.0, 1.0);
        assert!((m.distance(3, 4) - 4.0).abs() < 1e-5);

        let half = DistanceParams::new(1.0, 0.5);
        assert!((half.distance(3, 4) - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_monotone_in_displacement() {
        for &(mk, cb) in &[(-3.0, 0.0), (0.0, 0.3), (1.0, 0.0), (4.0, 1.0)] {
            let m = DistanceParams::new(mk, cb);
            let mut last = 0.0;
            for step in 1..12 {
                let d = m.distance(step, step / 2);
                assert!(d >= last, "metric must grow along a path ({mk}, {cb})");
                last = d;
            }
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(DistanceParams::new(10.5, 0.0).validate().is_err());
        assert!(DistanceParams::new(0.0, -0.1).validate().is_err());
        assert!(DistanceParams::new(-10.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip() {
        let m = DistanceParams::new(2.5, 0.25);
        let json = serde_json::to_string(&m).unwrap();
        let back: DistanceParams = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
