use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ensure_finite, ClearanceError};
use crate::geo::{earth_bulge, los_height};
use crate::physics::refraction::{effective_earth_radius, RefractionParams};
use crate::physics::wave::{calculate_wavelength, clearance_floor, fresnel_radius};

/// Number of path intervals scanned per evaluation.
pub const DEFAULT_SAMPLES: usize = 600;

/// Half-width of the obstacle footprint along the path.
pub const OBSTACLE_HALF_WIDTH_M: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    pub distance_m: f64,
    pub frequency_hz: f64,
    pub tx_height_m: f64,
    pub rx_height_m: f64,
}

impl LinkGeometry {
    pub fn new(distance_m: f64, frequency_hz: f64, tx_height_m: f64, rx_height_m: f64) -> Self {
        Self { distance_m, frequency_hz, tx_height_m, rx_height_m }
    }

    pub fn wavelength_m(&self) -> f64 {
        calculate_wavelength(self.frequency_hz)
    }

    pub fn los_height_at(&self, x_m: f64) -> f64 {
        los_height(x_m, self.distance_m, self.tx_height_m, self.rx_height_m)
    }

    pub fn validate(&self) -> Result<(), ClearanceError> {
        ensure_finite("distance_m", self.distance_m)?;
        ensure_finite("frequency_hz", self.frequency_hz)?;
        ensure_finite("tx_height_m", self.tx_height_m)?;
        ensure_finite("rx_height_m", self.rx_height_m)?;
        if self.distance_m < 0.0 {
            return Err(ClearanceError::NegativeDistance(self.distance_m));
        }
        if self.frequency_hz <= 0.0 {
            return Err(ClearanceError::NonPositiveFrequency(self.frequency_hz));
        }
        Ok(())
    }
}

/// A single block-shaped obstruction standing on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position_m: f64,
    pub height_m: f64,
    pub half_width_m: f64,
}

impl Obstacle {
    pub fn new(position_m: f64, height_m: f64) -> Self {
        Self { position_m, height_m, half_width_m: OBSTACLE_HALF_WIDTH_M }
    }

    /// Zero-height obstacle at TX; contributes nothing to the blocking profile.
    pub fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn covers(&self, x_m: f64) -> bool {
        (x_m - self.position_m).abs() < self.half_width_m
    }

    /// Top of the obstacle at `x_m`, or `None` when `x_m` is outside its
    /// footprint. With curvature the obstacle stands on the bulge.
    pub fn top_at(&self, x_m: f64, ground_m: f64, use_curvature: bool) -> Option<f64> {
        if !self.covers(x_m) {
            return None;
        }
        Some(if use_curvature { self.height_m + ground_m } else { self.height_m })
    }

    pub fn validate(&self, distance_m: f64) -> Result<(), ClearanceError> {
        ensure_finite("obstacle_position_m", self.position_m)?;
        ensure_finite("obstacle_height_m", self.height_m)?;
        ensure_finite("obstacle_half_width_m", self.half_width_m)?;
        if self.position_m < 0.0 || self.position_m > distance_m {
            return Err(ClearanceError::ObstacleOutOfRange {
                position_m: self.position_m,
                distance_m,
            });
        }
        if self.height_m < 0.0 {
            return Err(ClearanceError::NegativeObstacleHeight(self.height_m));
        }
        if self.half_width_m <= 0.0 {
            return Err(ClearanceError::NonPositiveHalfWidth(self.half_width_m));
        }
        Ok(())
    }
}

/// Worst point of the scanned path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearanceResult {
    /// Signed margin in meters; negative means the 60% zone is obstructed.
    pub worst_margin_m: f64,
    /// Distance from TX where the worst margin occurs.
    pub worst_position_m: f64,
}

impl ClearanceResult {
    pub fn is_clear(&self) -> bool {
        self.worst_margin_m >= 0.0
    }

    /// How many meters of clearance are missing, zero when clear.
    pub fn shortfall_m(&self) -> f64 {
        (-self.worst_margin_m).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearanceEvaluator {
    pub refraction: RefractionParams,
    pub samples: usize,
}

impl Default for ClearanceEvaluator {
    fn default() -> Self {
        Self::new(RefractionParams::default())
    }
}

impl ClearanceEvaluator {
    pub fn new(refraction: RefractionParams) -> Self {
        Self { refraction, samples: DEFAULT_SAMPLES }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Earth bulge at `x_m`, zero on a flat earth.
    pub fn ground_at(&self, x_m: f64, distance_m: f64, use_curvature: bool) -> f64 {
        if use_curvature {
            earth_bulge(x_m, distance_m, effective_earth_radius(self.refraction))
        } else {
            0.0
        }
    }

    /// Highest obstruction (ground or obstacle) at `x_m`.
    pub fn blocking_height_at(
        &self,
        x_m: f64,
        distance_m: f64,
        obstacle: &Obstacle,
        use_curvature: bool,
    ) -> f64 {
        let ground = self.ground_at(x_m, distance_m, use_curvature);
        let obst = obstacle.top_at(x_m, ground, use_curvature).unwrap_or(0.0);
        ground.max(obst)
    }

    /// Scans the path and returns the smallest margin between the 60% Fresnel
    /// floor and the obstruction profile. Total for any `distance_m`: a
    /// zero or negative distance has no Fresnel zone and no bulge.
    pub fn evaluate(
        &self,
        geometry: &LinkGeometry,
        obstacle: &Obstacle,
        use_curvature: bool,
    ) -> ClearanceResult {
        let lambda = geometry.wavelength_m();
        let d = geometry.distance_m;
        let n = self.samples.max(1);

        let mut worst = ClearanceResult {
            worst_margin_m: f64::INFINITY,
            worst_position_m: 0.0,
        };

        for i in 0..=n {
            let x = d * i as f64 / n as f64;
            let r1 = fresnel_radius(x, d, lambda);
            let need = clearance_floor(geometry.los_height_at(x), r1);
            let margin = need - self.blocking_height_at(x, d, obstacle, use_curvature);

            if margin < worst.worst_margin_m {
                worst.worst_margin_m = margin;
                worst.worst_position_m = x;
            }
        }

        trace!(
            distance_m = d,
            frequency_hz = geometry.frequency_hz,
            use_curvature,
            samples = n,
            margin_m = worst.worst_margin_m,
            at_m = worst.worst_position_m,
            "clearance evaluated"
        );

        worst
    }

    /// Validates every input, then evaluates. Valid inputs give exactly the
    /// result of [`ClearanceEvaluator::evaluate`].
    pub fn evaluate_checked(
        &self,
        geometry: &LinkGeometry,
        obstacle: &Obstacle,
        use_curvature: bool,
    ) -> Result<ClearanceResult, ClearanceError> {
        self.validate()?;
        geometry.validate()?;
        obstacle.validate(geometry.distance_m)?;
        Ok(self.evaluate(geometry, obstacle, use_curvature))
    }

    pub fn validate(&self) -> Result<(), ClearanceError> {
        let k = ensure_finite("k_factor", self.refraction.k_factor)?;
        if k <= 0.0 {
            return Err(ClearanceError::NonPositiveKFactor(k));
        }
        if self.samples == 0 {
            return Err(ClearanceError::ZeroSamples);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_link() -> LinkGeometry {
        LinkGeometry::new(50_000.0, 2e9, 40.0, 35.0)
    }

    #[test]
    fn clear_link_without_obstacle() {
        let eval = ClearanceEvaluator::default();
        let res = eval.evaluate(&reference_link(), &Obstacle::new(20_000.0, 0.0), false);
        assert!(res.is_clear());
        // Minimum of 40 - 5t - 0.6 * sqrt(7500 t (1 - t)) sits just past mid-path
        assert!(res.worst_margin_m > 11.0 && res.worst_margin_m < 12.0);
        assert_eq!(res.shortfall_m(), 0.0);
    }

    #[test]
    fn tall_mid_path_obstacle_blocks() {
        let link = reference_link();
        let eval = ClearanceEvaluator::default();
        let res = eval.evaluate(&link, &Obstacle::new(link.distance_m / 2.0, 200.0), false);
        assert!(!res.is_clear());
        assert!((res.worst_position_m - 25_000.0).abs() < 25.0);
        // floor at mid-path is 37.5 - 0.6 * sqrt(1875)
        let expected = 37.5 - 0.6 * 1875.0f64.sqrt() - 200.0;
        assert!((res.worst_margin_m - expected).abs() < 1e-9);
        assert!((res.shortfall_m() + expected).abs() < 1e-9);
    }

    #[test]
    fn curvature_lifts_obstacle_onto_bulge() {
        let link = reference_link();
        let eval = ClearanceEvaluator::default();
        let obstacle = Obstacle::new(25_000.0, 10.0);
        let flat = eval.evaluate(&link, &obstacle, false);
        let curved = eval.evaluate(&link, &obstacle, true);

        let bulge = eval.ground_at(25_000.0, link.distance_m, true);
        assert!(bulge > 36.0 && bulge < 37.5);
        assert!((flat.worst_margin_m - curved.worst_margin_m - bulge).abs() < 1e-9);
    }

    #[test]
    fn obstacle_footprint_is_open_interval() {
        let obstacle = Obstacle::new(1_000.0, 5.0);
        assert!(obstacle.covers(1_024.9));
        assert!(!obstacle.covers(1_025.0));
        assert!(!obstacle.covers(975.0));
        assert_eq!(obstacle.top_at(1_000.0, 3.0, true), Some(8.0));
        assert_eq!(obstacle.top_at(1_000.0, 3.0, false), Some(5.0));
        assert_eq!(obstacle.top_at(2_000.0, 3.0, true), None);
    }

    #[test]
    fn zero_distance_is_total() {
        let eval = ClearanceEvaluator::default();
        let link = LinkGeometry::new(0.0, 2e9, 12.0, 30.0);
        let res = eval.evaluate(&link, &Obstacle::none(), true);
        assert!(res.worst_margin_m.is_finite());
        assert_eq!(res.worst_margin_m, 12.0);
        assert_eq!(res.worst_position_m, 0.0);
    }

    #[test]
    fn negative_distance_still_interpolates_los() {
        let eval = ClearanceEvaluator::default();
        let link = LinkGeometry::new(-1_000.0, 2e9, 30.0, 10.0);
        let res = eval.evaluate(&link, &Obstacle::none(), false);
        // no Fresnel zone or bulge, the RX end is the lowest point of the line
        assert_eq!(res.worst_margin_m, 10.0);
        assert_eq!(res.worst_position_m, -1_000.0);
        assert_eq!(eval.ground_at(-500.0, link.distance_m, true), 0.0);
    }

    #[test]
    fn zero_samples_still_scans_endpoints() {
        let eval = ClearanceEvaluator::default().with_samples(0);
        let res = eval.evaluate(&reference_link(), &Obstacle::none(), false);
        // only x = 0 and x = D are visited; RX is the lower end
        assert_eq!(res.worst_margin_m, 35.0);
        assert_eq!(res.worst_position_m, 50_000.0);
    }

    #[test]
    fn checked_matches_unchecked_for_valid_input() {
        let eval = ClearanceEvaluator::default();
        let link = reference_link();
        let obstacle = Obstacle::new(20_000.0, 20.0);
        assert_eq!(
            eval.evaluate_checked(&link, &obstacle, true),
            Ok(eval.evaluate(&link, &obstacle, true))
        );
    }

    #[test]
    fn checked_rejects_bad_inputs() {
        let eval = ClearanceEvaluator::default();
        let ok = Obstacle::new(100.0, 1.0);

        let neg = LinkGeometry::new(-1.0, 2e9, 10.0, 10.0);
        assert_eq!(
            eval.evaluate_checked(&neg, &ok, false),
            Err(ClearanceError::NegativeDistance(-1.0))
        );

        let no_freq = LinkGeometry::new(1_000.0, 0.0, 10.0, 10.0);
        assert_eq!(
            eval.evaluate_checked(&no_freq, &ok, false),
            Err(ClearanceError::NonPositiveFrequency(0.0))
        );

        let nan = LinkGeometry::new(1_000.0, 2e9, f64::NAN, 10.0);
        assert!(matches!(
            eval.evaluate_checked(&nan, &ok, false),
            Err(ClearanceError::NonFinite { field: "tx_height_m", .. })
        ));

        let link = LinkGeometry::new(1_000.0, 2e9, 10.0, 10.0);
        assert!(matches!(
            eval.evaluate_checked(&link, &Obstacle::new(1_500.0, 1.0), false),
            Err(ClearanceError::ObstacleOutOfRange { .. })
        ));
        assert_eq!(
            eval.evaluate_checked(&link, &Obstacle::new(500.0, -2.0), false),
            Err(ClearanceError::NegativeObstacleHeight(-2.0))
        );

        let narrow = Obstacle { half_width_m: 0.0, ..ok };
        assert_eq!(
            eval.evaluate_checked(&link, &narrow, false),
            Err(ClearanceError::NonPositiveHalfWidth(0.0))
        );

        let no_samples = eval.with_samples(0);
        assert_eq!(
            no_samples.evaluate_checked(&link, &ok, false),
            Err(ClearanceError::ZeroSamples)
        );

        let bad_k = ClearanceEvaluator::new(RefractionParams { k_factor: 0.0 });
        assert_eq!(
            bad_k.evaluate_checked(&link, &ok, true),
            Err(ClearanceError::NonPositiveKFactor(0.0))
        );
    }
}
