use serde::{Deserialize, Serialize};
use crate::geo::EARTH_RADIUS;

/// Standard-atmosphere K-factor.
pub const STANDARD_K_FACTOR: f64 = 4.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefractionParams {
    pub k_factor: f64,
}

impl Default for RefractionParams {
    fn default() -> Self {
        Self { k_factor: STANDARD_K_FACTOR }
    }
}

pub fn effective_earth_radius(params: RefractionParams) -> f64 {
    EARTH_RADIUS * params.k_factor
}
