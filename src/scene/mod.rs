use std::str::FromStr;
use tracing::debug;

use crate::physics::clearance::{
    ClearanceEvaluator, ClearanceResult, LinkGeometry, Obstacle, OBSTACLE_HALF_WIDTH_M,
};
use crate::physics::profile::LinkProfile;
use crate::physics::wave::{fresnel_radius, CLEARANCE_FRACTION};

pub const DISTANCE_STEP_M: f64 = 1_000.0;
pub const MIN_DISTANCE_M: f64 = 1_000.0;
pub const MAX_DISTANCE_M: f64 = 200_000.0;

pub const FREQUENCY_STEP_HZ: f64 = 50e6;
pub const MIN_FREQUENCY_HZ: f64 = 50e6;
pub const MAX_FREQUENCY_HZ: f64 = 20e9;

pub const HEIGHT_STEP_M: f64 = 1.0;
pub const MAX_HEIGHT_M: f64 = 500.0;

pub const OBSTACLE_STEP_M: f64 = 100.0;

/// Adjustments a host can apply to the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneCommand {
    DistanceDown,
    DistanceUp,
    FrequencyDown,
    FrequencyUp,
    TxUp,
    TxDown,
    RxUp,
    RxDown,
    ObstacleTowardTx,
    ObstacleTowardRx,
    ObstacleLower,
    ObstacleRaise,
    /// Place the obstacle at a fraction (0..1) of the link.
    ObstacleAt(f64),
    ToggleCurvature,
    Reset,
}

impl SceneCommand {
    pub fn label(&self) -> &'static str {
        match self {
            SceneCommand::DistanceDown => "distance -1 km",
            SceneCommand::DistanceUp => "distance +1 km",
            SceneCommand::FrequencyDown => "frequency -50 MHz",
            SceneCommand::FrequencyUp => "frequency +50 MHz",
            SceneCommand::TxUp => "TX height +1 m",
            SceneCommand::TxDown => "TX height -1 m",
            SceneCommand::RxUp => "RX height +1 m",
            SceneCommand::RxDown => "RX height -1 m",
            SceneCommand::ObstacleTowardTx => "obstacle -100 m",
            SceneCommand::ObstacleTowardRx => "obstacle +100 m",
            SceneCommand::ObstacleLower => "obstacle height -1 m",
            SceneCommand::ObstacleRaise => "obstacle height +1 m",
            SceneCommand::ObstacleAt(_) => "obstacle position",
            SceneCommand::ToggleCurvature => "toggle curvature",
            SceneCommand::Reset => "reset",
        }
    }
}

impl FromStr for SceneCommand {
    type Err = String;

    /// Accepts the kebab-case command names, and `obstacle-at=<fraction>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(frac) = s.strip_prefix("obstacle-at=") {
            return frac
                .parse::<f64>()
                .map(SceneCommand::ObstacleAt)
                .map_err(|e| format!("invalid obstacle fraction {frac:?}: {e}"));
        }
        let cmd = match s {
            "distance-down" => SceneCommand::DistanceDown,
            "distance-up" => SceneCommand::DistanceUp,
            "frequency-down" => SceneCommand::FrequencyDown,
            "frequency-up" => SceneCommand::FrequencyUp,
            "tx-up" => SceneCommand::TxUp,
            "tx-down" => SceneCommand::TxDown,
            "rx-up" => SceneCommand::RxUp,
            "rx-down" => SceneCommand::RxDown,
            "obstacle-left" => SceneCommand::ObstacleTowardTx,
            "obstacle-right" => SceneCommand::ObstacleTowardRx,
            "obstacle-lower" => SceneCommand::ObstacleLower,
            "obstacle-raise" => SceneCommand::ObstacleRaise,
            "toggle-curvature" => SceneCommand::ToggleCurvature,
            "reset" => SceneCommand::Reset,
            other => return Err(format!("unknown scene command {other:?}")),
        };
        Ok(cmd)
    }
}

/// Immutable snapshot of the scene handed to the evaluator each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    pub geometry: LinkGeometry,
    pub obstacle: Obstacle,
    pub use_curvature: bool,
}

impl SceneConfig {
    pub fn evaluate(&self, evaluator: &ClearanceEvaluator) -> ClearanceResult {
        evaluator.evaluate(&self.geometry, &self.obstacle, self.use_curvature)
    }

    pub fn profile(&self, evaluator: &ClearanceEvaluator, samples: usize) -> LinkProfile {
        LinkProfile::sample(evaluator, self.geometry, self.obstacle, self.use_curvature, samples)
    }

    /// Human-readable summary of the link and its clearance verdict.
    pub fn status_lines(&self, result: &ClearanceResult) -> [String; 4] {
        let g = &self.geometry;
        let o = &self.obstacle;
        let lambda = g.wavelength_m();
        let mid_r1 = fresnel_radius(g.distance_m / 2.0, g.distance_m, lambda);

        let verdict = if result.is_clear() {
            "60% of first Fresnel zone clear".to_string()
        } else {
            format!(
                "missing {:.2} m of 60% Fresnel clearance at x = {:.2} km",
                result.shortfall_m(),
                result.worst_position_m / 1000.0
            )
        };

        [
            format!(
                "D={:.1} km  f={:.3} GHz  lambda={:.2} cm",
                g.distance_m / 1000.0,
                g.frequency_hz / 1e9,
                lambda * 100.0
            ),
            format!(
                "TX={:.1} m  RX={:.1} m  Obs@{:.2} km h={:.1} m",
                g.tx_height_m,
                g.rx_height_m,
                o.position_m / 1000.0,
                o.height_m
            ),
            format!(
                "F1@mid={:.2} m  (60%={:.2} m)  curvature={}",
                mid_r1,
                CLEARANCE_FRACTION * mid_r1,
                if self.use_curvature { "on" } else { "off" }
            ),
            verdict,
        ]
    }
}

/// Host-owned, mutable link state. The obstacle is kept as a fraction of the
/// link so it stays at the same relative spot when the distance changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneState {
    pub distance_m: f64,
    pub frequency_hz: f64,
    pub tx_height_m: f64,
    pub rx_height_m: f64,
    pub obstacle_fraction: f64,
    pub obstacle_height_m: f64,
    pub obstacle_half_width_m: f64,
    pub use_curvature: bool,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            distance_m: 50_000.0,
            frequency_hz: 2e9,
            tx_height_m: 40.0,
            rx_height_m: 35.0,
            obstacle_fraction: 0.4,
            obstacle_height_m: 20.0,
            obstacle_half_width_m: OBSTACLE_HALF_WIDTH_M,
            use_curvature: true,
        }
    }
}

impl SceneState {
    pub fn from_config(config: &SceneConfig) -> Self {
        let d = config.geometry.distance_m;
        let obstacle_fraction = if d > 0.0 {
            (config.obstacle.position_m / d).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            distance_m: d,
            frequency_hz: config.geometry.frequency_hz,
            tx_height_m: config.geometry.tx_height_m,
            rx_height_m: config.geometry.rx_height_m,
            obstacle_fraction,
            obstacle_height_m: config.obstacle.height_m,
            obstacle_half_width_m: config.obstacle.half_width_m,
            use_curvature: config.use_curvature,
        }
    }

    pub fn obstacle_position_m(&self) -> f64 {
        self.obstacle_fraction * self.distance_m
    }

    pub fn config(&self) -> SceneConfig {
        SceneConfig {
            geometry: LinkGeometry::new(
                self.distance_m,
                self.frequency_hz,
                self.tx_height_m,
                self.rx_height_m,
            ),
            obstacle: Obstacle {
                position_m: self.obstacle_position_m(),
                height_m: self.obstacle_height_m,
                half_width_m: self.obstacle_half_width_m,
            },
            use_curvature: self.use_curvature,
        }
    }

    fn move_obstacle(&mut self, delta_m: f64) {
        if self.distance_m <= 0.0 {
            return;
        }
        let x = (self.obstacle_position_m() + delta_m).clamp(0.0, self.distance_m);
        self.obstacle_fraction = x / self.distance_m;
    }

    pub fn apply(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::DistanceDown => {
                self.distance_m = (self.distance_m - DISTANCE_STEP_M).max(MIN_DISTANCE_M)
            }
            SceneCommand::DistanceUp => {
                self.distance_m = (self.distance_m + DISTANCE_STEP_M).min(MAX_DISTANCE_M)
            }
            SceneCommand::FrequencyDown => {
                self.frequency_hz = (self.frequency_hz - FREQUENCY_STEP_HZ).max(MIN_FREQUENCY_HZ)
            }
            SceneCommand::FrequencyUp => {
                self.frequency_hz = (self.frequency_hz + FREQUENCY_STEP_HZ).min(MAX_FREQUENCY_HZ)
            }
            SceneCommand::TxUp => {
                self.tx_height_m = (self.tx_height_m + HEIGHT_STEP_M).min(MAX_HEIGHT_M)
            }
            SceneCommand::TxDown => self.tx_height_m = (self.tx_height_m - HEIGHT_STEP_M).max(0.0),
            SceneCommand::RxUp => {
                self.rx_height_m = (self.rx_height_m + HEIGHT_STEP_M).min(MAX_HEIGHT_M)
            }
            SceneCommand::RxDown => self.rx_height_m = (self.rx_height_m - HEIGHT_STEP_M).max(0.0),
            SceneCommand::ObstacleTowardTx => self.move_obstacle(-OBSTACLE_STEP_M),
            SceneCommand::ObstacleTowardRx => self.move_obstacle(OBSTACLE_STEP_M),
            SceneCommand::ObstacleLower => {
                self.obstacle_height_m = (self.obstacle_height_m - HEIGHT_STEP_M).max(0.0)
            }
            SceneCommand::ObstacleRaise => {
                self.obstacle_height_m = (self.obstacle_height_m + HEIGHT_STEP_M).min(MAX_HEIGHT_M)
            }
            SceneCommand::ObstacleAt(frac) => {
                if frac.is_finite() {
                    self.obstacle_fraction = frac.clamp(0.0, 1.0);
                }
            }
            SceneCommand::ToggleCurvature => self.use_curvature = !self.use_curvature,
            SceneCommand::Reset => *self = Self::default(),
        }
        debug!(command = command.label(), state = ?self, "scene updated");
    }

    /// Applies typed-in RX height, TX height and distance, in that order, as
    /// whole meters. Stops at the first entry that does not parse, or at a
    /// distance outside the scene bounds; fields before it keep their new value.
    /// Returns whether every entry was applied.
    pub fn apply_text_entries(&mut self, rx: &str, tx: &str, distance: &str) -> bool {
        let Ok(rx) = rx.trim().parse::<i64>() else { return false };
        self.rx_height_m = rx as f64;

        let Ok(tx) = tx.trim().parse::<i64>() else { return false };
        self.tx_height_m = tx as f64;

        let Ok(d) = distance.trim().parse::<i64>() else { return false };
        let d = d as f64;
        if !(MIN_DISTANCE_M..=MAX_DISTANCE_M).contains(&d) {
            return false;
        }
        self.distance_m = d;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_link() {
        let cfg = SceneState::default().config();
        assert_eq!(cfg.geometry, LinkGeometry::new(50_000.0, 2e9, 40.0, 35.0));
        assert_eq!(cfg.obstacle.position_m, 20_000.0);
        assert_eq!(cfg.obstacle.height_m, 20.0);
        assert!(cfg.use_curvature);
    }

    #[test]
    fn bounds_clamp() {
        let mut s = SceneState { distance_m: 1_500.0, ..SceneState::default() };
        s.apply(SceneCommand::DistanceDown);
        assert_eq!(s.distance_m, MIN_DISTANCE_M);
        s.apply(SceneCommand::DistanceDown);
        assert_eq!(s.distance_m, MIN_DISTANCE_M);

        s.distance_m = 199_500.0;
        s.apply(SceneCommand::DistanceUp);
        assert_eq!(s.distance_m, MAX_DISTANCE_M);

        s.frequency_hz = 60e6;
        s.apply(SceneCommand::FrequencyDown);
        assert_eq!(s.frequency_hz, MIN_FREQUENCY_HZ);
        s.frequency_hz = 19.99e9;
        s.apply(SceneCommand::FrequencyUp);
        assert_eq!(s.frequency_hz, MAX_FREQUENCY_HZ);

        s.tx_height_m = 0.5;
        s.apply(SceneCommand::TxDown);
        assert_eq!(s.tx_height_m, 0.0);
        s.rx_height_m = 500.0;
        s.apply(SceneCommand::RxUp);
        assert_eq!(s.rx_height_m, MAX_HEIGHT_M);

        s.obstacle_height_m = 0.0;
        s.apply(SceneCommand::ObstacleLower);
        assert_eq!(s.obstacle_height_m, 0.0);
    }

    #[test]
    fn obstacle_follows_distance() {
        let mut s = SceneState::default();
        s.apply(SceneCommand::DistanceUp);
        assert_eq!(s.config().obstacle.position_m, 0.4 * 51_000.0);
    }

    #[test]
    fn obstacle_steps_stay_on_link() {
        let mut s = SceneState::default();
        s.apply(SceneCommand::ObstacleTowardRx);
        assert!((s.obstacle_position_m() - 20_100.0).abs() < 1e-6);

        s.apply(SceneCommand::ObstacleAt(0.0005));
        s.apply(SceneCommand::ObstacleTowardTx);
        assert_eq!(s.obstacle_position_m(), 0.0);

        s.apply(SceneCommand::ObstacleAt(7.0));
        assert_eq!(s.obstacle_fraction, 1.0);
        s.apply(SceneCommand::ObstacleAt(f64::NAN));
        assert_eq!(s.obstacle_fraction, 1.0);
    }

    #[test]
    fn toggle_and_reset() {
        let mut s = SceneState::default();
        s.apply(SceneCommand::ToggleCurvature);
        assert!(!s.use_curvature);
        s.apply(SceneCommand::TxUp);
        s.apply(SceneCommand::Reset);
        assert_eq!(s, SceneState::default());
    }

    #[test]
    fn text_entries_keep_previous_on_garbage() {
        let mut s = SceneState::default();
        // rx fails first, nothing after it is touched
        assert!(!s.apply_text_entries("abc", "60", "-5"));
        assert_eq!(s, SceneState::default());

        // tx fails, rx already applied
        assert!(!s.apply_text_entries(" 60 ", "abc", "20000"));
        assert_eq!(s.rx_height_m, 60.0);
        assert_eq!(s.tx_height_m, 40.0);
        assert_eq!(s.distance_m, 50_000.0);

        assert!(s.apply_text_entries("10", "12", "30000"));
        assert_eq!((s.rx_height_m, s.tx_height_m, s.distance_m), (10.0, 12.0, 30_000.0));
    }

    #[test]
    fn text_entry_distance_respects_bounds() {
        let mut s = SceneState::default();
        assert!(!s.apply_text_entries("35", "40", "0"));
        assert!(!s.apply_text_entries("35", "40", "-5"));
        assert!(!s.apply_text_entries("35", "40", "250000"));
        assert_eq!(s.distance_m, 50_000.0);
    }

    #[test]
    fn parses_commands() {
        assert_eq!("tx-up".parse::<SceneCommand>(), Ok(SceneCommand::TxUp));
        assert_eq!("obstacle-at=0.25".parse::<SceneCommand>(), Ok(SceneCommand::ObstacleAt(0.25)));
        assert!("obstacle-at=half".parse::<SceneCommand>().is_err());
        assert!("jump".parse::<SceneCommand>().is_err());
    }

    #[test]
    fn config_round_trips_through_state() {
        let cfg = SceneState::default().config();
        assert_eq!(SceneState::from_config(&cfg).config(), cfg);
    }

    #[test]
    fn status_reports_blocked_default_scene() {
        let cfg = SceneState::default().config();
        let res = cfg.evaluate(&ClearanceEvaluator::default());
        let lines = cfg.status_lines(&res);
        assert_eq!(lines[0], "D=50.0 km  f=2.000 GHz  lambda=15.00 cm");
        assert_eq!(lines[1], "TX=40.0 m  RX=35.0 m  Obs@20.00 km h=20.0 m");
        assert!(lines[3].starts_with("missing 42.77 m"));
        assert!(lines[3].ends_with("x = 20.00 km"));
    }
}
