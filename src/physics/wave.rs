/// Speed of light approximation used for every wavelength in the crate.
pub const C_LIGHT: f64 = 3e8;

/// Fraction of the first Fresnel zone that must stay unobstructed.
pub const CLEARANCE_FRACTION: f64 = 0.6;

pub fn calculate_wavelength(freq_hz: f64) -> f64 {
    C_LIGHT / freq_hz
}

/// Radius of the first Fresnel zone at `x_m` along a link of `distance_m`.
///
/// r1(x) = sqrt(λ x (D - x) / D), clamped at zero so samples that land a
/// hair outside the link do not produce NaN. Zero for `distance_m <= 0`.
pub fn fresnel_radius(x_m: f64, distance_m: f64, wavelength_m: f64) -> f64 {
    fresnel_zone_radius(1, x_m, distance_m, wavelength_m)
}

/// Radius of the n-th Fresnel zone: rn = sqrt(n) * r1.
pub fn fresnel_zone_radius(zone: u32, x_m: f64, distance_m: f64, wavelength_m: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    let n = zone as f64;
    (n * wavelength_m * x_m * (distance_m - x_m) / distance_m)
        .max(0.0)
        .sqrt()
}

/// Lowest height the obstruction profile may reach at `x_m` while keeping
/// 60% of the first Fresnel zone clear.
pub fn clearance_floor(los_height_m: f64, fresnel_radius_m: f64) -> f64 {
    los_height_m - CLEARANCE_FRACTION * fresnel_radius_m
}
