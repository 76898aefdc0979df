use fresnel_clearance::physics::clearance::{ClearanceEvaluator, LinkGeometry, Obstacle};
use fresnel_clearance::physics::refraction::RefractionParams;
use fresnel_clearance::physics::wave::fresnel_radius;

fn main() {
    let link = LinkGeometry::new(50_000.0, 2e9, 40.0, 35.0);
    let evaluator = ClearanceEvaluator::new(RefractionParams::default());

    println!(
        "Link: {:.1} km at {:.3} GHz, lambda = {:.2} cm",
        link.distance_m / 1000.0,
        link.frequency_hz / 1e9,
        link.wavelength_m() * 100.0
    );
    let mid = fresnel_radius(link.distance_m / 2.0, link.distance_m, link.wavelength_m());
    println!("F1 at mid-path: {:.2} m (60% = {:.2} m)", mid, 0.6 * mid);

    for (label, obstacle, curvature) in [
        ("flat, no obstacle", Obstacle::none(), false),
        ("curved, no obstacle", Obstacle::none(), true),
        ("flat, 200 m mid-path", Obstacle::new(25_000.0, 200.0), false),
        ("curved, 20 m at 20 km", Obstacle::new(20_000.0, 20.0), true),
    ] {
        let res = evaluator.evaluate(&link, &obstacle, curvature);
        println!(
            "{:<24} margin {:>9.2} m at {:>6.2} km  {}",
            label,
            res.worst_margin_m,
            res.worst_position_m / 1000.0,
            if res.is_clear() { "clear" } else { "blocked" }
        );
    }
}
