use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::physics::clearance::{ClearanceEvaluator, LinkGeometry, Obstacle};
use crate::physics::wave::{clearance_floor, fresnel_radius, CLEARANCE_FRACTION};

/// Resolution used when a host draws the link.
pub const DEFAULT_PROFILE_SAMPLES: usize = 300;

/// One sampled point of the link, with every curve a host draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub x_m: f64,
    pub los_m: f64,
    pub fresnel_radius_m: f64,
    pub fresnel_upper_m: f64,
    pub fresnel_lower_m: f64,
    pub clearance_floor_m: f64,
    pub ground_m: f64,
    /// Top of the obstacle when this sample falls inside its footprint.
    pub obstacle_top_m: Option<f64>,
}

impl ProfilePoint {
    /// Signed gap between the 60% floor and whatever blocks at this point.
    pub fn margin_m(&self) -> f64 {
        let blocking = self.ground_m.max(self.obstacle_top_m.unwrap_or(0.0));
        self.clearance_floor_m - blocking
    }
}

#[derive(Debug, Clone)]
pub struct LinkProfile {
    pub geometry: LinkGeometry,
    pub obstacle: Obstacle,
    pub use_curvature: bool,
    pub points: Vec<ProfilePoint>,
}

impl LinkProfile {
    /// Samples `samples + 1` evenly spaced points from TX to RX.
    pub fn sample(
        evaluator: &ClearanceEvaluator,
        geometry: LinkGeometry,
        obstacle: Obstacle,
        use_curvature: bool,
        samples: usize,
    ) -> Self {
        let n = samples.max(1);
        let d = geometry.distance_m;
        let lambda = geometry.wavelength_m();

        let points = (0..=n)
            .map(|i| {
                let x = d * i as f64 / n as f64;
                let los = geometry.los_height_at(x);
                let r1 = fresnel_radius(x, d, lambda);
                let ground = evaluator.ground_at(x, d, use_curvature);
                ProfilePoint {
                    x_m: x,
                    los_m: los,
                    fresnel_radius_m: r1,
                    fresnel_upper_m: los + r1,
                    fresnel_lower_m: los - r1,
                    clearance_floor_m: clearance_floor(los, r1),
                    ground_m: ground,
                    obstacle_top_m: obstacle.top_at(x, ground, use_curvature),
                }
            })
            .collect();

        Self { geometry, obstacle, use_curvature, points }
    }

    /// First Fresnel zone radius at the middle of the link.
    pub fn mid_path_fresnel_radius(&self) -> f64 {
        let d = self.geometry.distance_m;
        fresnel_radius(d / 2.0, d, self.geometry.wavelength_m())
    }

    /// Part of the mid-path radius that must stay clear.
    pub fn clearance_at_mid(&self) -> f64 {
        CLEARANCE_FRACTION * self.mid_path_fresnel_radius()
    }

    /// Lowest and highest height across all drawn curves, for axis scaling.
    pub fn height_bounds(&self) -> Option<(f64, f64)> {
        let heights = self.points.iter().flat_map(|p| {
            [p.fresnel_upper_m, p.fresnel_lower_m, p.ground_m]
                .into_iter()
                .chain(p.obstacle_top_m)
        });
        match heights.minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(h) => Some((h, h)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// Sample with the smallest margin, first on ties.
    pub fn worst_point(&self) -> Option<&ProfilePoint> {
        self.points
            .iter()
            .reduce(|best, p| if p.margin_m() < best.margin_m() { p } else { best })
    }
}
