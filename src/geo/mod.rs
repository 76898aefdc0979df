
/// Mean earth radius in meters.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Height of the earth's surface above the straight TX-RX chord at `x_m`
/// along a link of length `distance_m`:
///
/// b(x) = x (D - x) / (2 R_eff)
///
/// Zero at both ends, maximal at mid-path. Degenerate geometry
/// (`distance_m <= 0`) has no bulge.
pub fn earth_bulge(x_m: f64, distance_m: f64, r_eff: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    (x_m * (distance_m - x_m)) / (2.0 * r_eff)
}

/// Fraction of the link covered at `x_m`, 0 at TX and 1 at RX. Only a
/// zero-length link has no defined ratio; it stays at TX.
pub fn path_fraction(x_m: f64, distance_m: f64) -> f64 {
    if distance_m == 0.0 { 0.0 } else { x_m / distance_m }
}

/// Straight line-of-sight height at `x_m`, linearly interpolated between the
/// two antenna heights.
pub fn los_height(x_m: f64, distance_m: f64, h_tx: f64, h_rx: f64) -> f64 {
    h_tx + (h_rx - h_tx) * path_fraction(x_m, distance_m)
}
