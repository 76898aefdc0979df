use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::info;

use crate::physics::clearance::{
    ClearanceEvaluator, LinkGeometry, Obstacle, DEFAULT_SAMPLES, OBSTACLE_HALF_WIDTH_M,
};
use crate::physics::profile::LinkProfile;
use crate::physics::refraction::{RefractionParams, STANDARD_K_FACTOR};
use crate::scene::SceneConfig;

fn default_half_width() -> f64 {
    OBSTACLE_HALF_WIDTH_M
}

fn default_true() -> bool {
    true
}

fn default_k_factor() -> f64 {
    STANDARD_K_FACTOR
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub distance_m: f64,
    pub frequency_hz: f64,
    pub tx_height_m: f64,
    pub rx_height_m: f64,
    #[serde(default)]
    pub obstacle_position_m: f64,
    #[serde(default)]
    pub obstacle_height_m: f64,
    #[serde(default = "default_half_width")]
    pub obstacle_half_width_m: f64,
    #[serde(default = "default_true")]
    pub use_curvature: bool,
    #[serde(default = "default_k_factor")]
    pub k_factor: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
}

impl Scenario {
    pub fn geometry(&self) -> LinkGeometry {
        LinkGeometry::new(self.distance_m, self.frequency_hz, self.tx_height_m, self.rx_height_m)
    }

    pub fn obstacle(&self) -> Obstacle {
        Obstacle {
            position_m: self.obstacle_position_m,
            height_m: self.obstacle_height_m,
            half_width_m: self.obstacle_half_width_m,
        }
    }

    pub fn evaluator(&self) -> ClearanceEvaluator {
        ClearanceEvaluator::new(RefractionParams { k_factor: self.k_factor })
            .with_samples(self.samples)
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            geometry: self.geometry(),
            obstacle: self.obstacle(),
            use_curvature: self.use_curvature,
        }
    }
}

pub fn parse_scenarios(json: &str) -> anyhow::Result<Vec<Scenario>> {
    let scenarios: Vec<Scenario> = serde_json::from_str(json)?;
    Ok(scenarios)
}

pub fn load_scenarios_from_json(path: impl AsRef<Path>) -> anyhow::Result<Vec<Scenario>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open scenario file {:?}", path))?;
    let reader = std::io::BufReader::new(file);
    let scenarios: Vec<Scenario> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse scenario file {:?}", path))?;
    info!(count = scenarios.len(), path = %path.display(), "loaded scenarios");
    Ok(scenarios)
}

pub fn compute_scenario_hash(scenario: &Scenario) -> u64 {
    let mut hasher = DefaultHasher::new();
    scenario.name.hash(&mut hasher);
    scenario.distance_m.to_bits().hash(&mut hasher);
    scenario.frequency_hz.to_bits().hash(&mut hasher);
    scenario.tx_height_m.to_bits().hash(&mut hasher);
    scenario.rx_height_m.to_bits().hash(&mut hasher);
    scenario.obstacle_position_m.to_bits().hash(&mut hasher);
    scenario.obstacle_height_m.to_bits().hash(&mut hasher);
    scenario.obstacle_half_width_m.to_bits().hash(&mut hasher);
    scenario.use_curvature.hash(&mut hasher);
    scenario.k_factor.to_bits().hash(&mut hasher);
    scenario.samples.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Serialize)]
struct ProfileRow {
    x_m: f64,
    los_m: f64,
    fresnel_radius_m: f64,
    fresnel_upper_m: f64,
    fresnel_lower_m: f64,
    clearance_floor_m: f64,
    ground_m: f64,
    obstacle_top_m: Option<f64>,
}

/// Writes one CSV row per profile point. Samples outside the obstacle leave
/// `obstacle_top_m` empty.
pub fn write_profile_csv<W: std::io::Write>(profile: &LinkProfile, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for p in &profile.points {
        wtr.serialize(ProfileRow {
            x_m: p.x_m,
            los_m: p.los_m,
            fresnel_radius_m: p.fresnel_radius_m,
            fresnel_upper_m: p.fresnel_upper_m,
            fresnel_lower_m: p.fresnel_lower_m,
            clearance_floor_m: p.clearance_floor_m,
            ground_m: p.ground_m,
            obstacle_top_m: p.obstacle_top_m,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_profile_csv(profile: &LinkProfile, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    write_profile_csv(profile, std::io::BufWriter::new(file))?;
    info!(rows = profile.points.len(), path = %path.display(), "profile written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIOS: &str = r#"[
        {
            "name": "ridge",
            "distance_m": 50000.0,
            "frequency_hz": 2e9,
            "tx_height_m": 40.0,
            "rx_height_m": 35.0,
            "obstacle_position_m": 20000.0,
            "obstacle_height_m": 20.0
        },
        {
            "name": "flat hop",
            "distance_m": 8000.0,
            "frequency_hz": 5.8e9,
            "tx_height_m": 15.0,
            "rx_height_m": 15.0,
            "use_curvature": false,
            "k_factor": 1.0,
            "samples": 100
        }
    ]"#;

    #[test]
    fn defaults_fill_missing_fields() {
        let scenarios = parse_scenarios(SCENARIOS).unwrap();
        assert_eq!(scenarios.len(), 2);

        let ridge = &scenarios[0];
        assert_eq!(ridge.obstacle_half_width_m, OBSTACLE_HALF_WIDTH_M);
        assert!(ridge.use_curvature);
        assert_eq!(ridge.k_factor, STANDARD_K_FACTOR);
        assert_eq!(ridge.samples, DEFAULT_SAMPLES);

        let hop = &scenarios[1];
        assert_eq!(hop.obstacle_height_m, 0.0);
        assert!(!hop.use_curvature);
        assert_eq!(hop.evaluator().samples, 100);
        assert_eq!(hop.evaluator().refraction.k_factor, 1.0);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(parse_scenarios(r#"[{"name": "x", "distance_m": 1.0}]"#).is_err());
    }

    #[test]
    fn hash_tracks_inputs() {
        let scenarios = parse_scenarios(SCENARIOS).unwrap();
        let a = compute_scenario_hash(&scenarios[0]);
        assert_eq!(a, compute_scenario_hash(&scenarios[0].clone()));
        let moved = Scenario { obstacle_position_m: 20_001.0, ..scenarios[0].clone() };
        assert_ne!(a, compute_scenario_hash(&moved));
    }

    #[test]
    fn csv_has_header_and_one_row_per_point() {
        let scenarios = parse_scenarios(SCENARIOS).unwrap();
        let ridge = &scenarios[0];
        let profile = ridge.scene_config().profile(&ridge.evaluator(), 50);

        let mut buf = Vec::new();
        write_profile_csv(&profile, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("x_m,los_m,fresnel_radius_m,fresnel_upper_m,fresnel_lower_m,clearance_floor_m,ground_m,obstacle_top_m")
        );
        assert_eq!(lines.count(), 51);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_scenarios_from_json("/nonexistent/links.json").unwrap_err();
        assert!(format!("{err}").contains("links.json"));
    }
}
