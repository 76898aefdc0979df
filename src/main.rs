use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use fresnel_clearance::cache::ClearanceCache;
use fresnel_clearance::io::{
    compute_scenario_hash, load_scenarios_from_json, save_profile_csv, Scenario,
};
use fresnel_clearance::physics::clearance::{
    ClearanceEvaluator, DEFAULT_SAMPLES, OBSTACLE_HALF_WIDTH_M,
};
use fresnel_clearance::physics::profile::DEFAULT_PROFILE_SAMPLES;
use fresnel_clearance::physics::refraction::STANDARD_K_FACTOR;
use fresnel_clearance::scene::{SceneCommand, SceneConfig, SceneState};

#[derive(Debug, Parser)]
#[command(name = "fresnel-clearance", about = "60% Fresnel zone clearance for point-to-point radio links")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the clearance verdict for each link.
    Check(LinkArgs),
    /// Export the sampled link profile as CSV.
    Profile {
        #[command(flatten)]
        link: LinkArgs,
        /// Points per profile.
        #[arg(long, default_value_t = DEFAULT_PROFILE_SAMPLES)]
        points: usize,
        /// Output CSV path. With several scenarios the name is suffixed.
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct LinkArgs {
    /// JSON file holding an array of scenarios. Overrides the link flags.
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 50_000.0)]
    distance_m: f64,
    #[arg(long, default_value_t = 2e9)]
    frequency_hz: f64,
    #[arg(long, default_value_t = 40.0)]
    tx_height_m: f64,
    #[arg(long, default_value_t = 35.0)]
    rx_height_m: f64,
    #[arg(long, default_value_t = 20_000.0)]
    obstacle_position_m: f64,
    #[arg(long, default_value_t = 20.0)]
    obstacle_height_m: f64,
    /// Evaluate over a flat earth.
    #[arg(long)]
    flat: bool,
    #[arg(long, default_value_t = STANDARD_K_FACTOR)]
    k_factor: f64,
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,
    /// Scene adjustments applied in order, e.g. `--step distance-up --step obstacle-at=0.5`.
    #[arg(long = "step")]
    steps: Vec<SceneCommand>,
}

impl LinkArgs {
    fn scenarios(&self) -> anyhow::Result<Vec<Scenario>> {
        if let Some(path) = &self.scenario {
            return load_scenarios_from_json(path);
        }
        Ok(vec![Scenario {
            name: "command line".to_string(),
            distance_m: self.distance_m,
            frequency_hz: self.frequency_hz,
            tx_height_m: self.tx_height_m,
            rx_height_m: self.rx_height_m,
            obstacle_position_m: self.obstacle_position_m,
            obstacle_height_m: self.obstacle_height_m,
            obstacle_half_width_m: OBSTACLE_HALF_WIDTH_M,
            use_curvature: !self.flat,
            k_factor: self.k_factor,
            samples: self.samples,
        }])
    }

    /// Scene for one scenario with the `--step` adjustments applied.
    fn scene(&self, scenario: &Scenario) -> SceneState {
        let mut scene = SceneState::from_config(&scenario.scene_config());
        for step in &self.steps {
            scene.apply(*step);
        }
        scene
    }
}

/// Rejects malformed scenarios before any scene step can clamp them.
fn prepare(link: &LinkArgs, scenario: &Scenario) -> anyhow::Result<(ClearanceEvaluator, SceneConfig)> {
    let ctx = || format!("scenario {:?}", scenario.name);
    let evaluator = scenario.evaluator();
    evaluator.validate().with_context(ctx)?;
    let geometry = scenario.geometry();
    geometry.validate().with_context(ctx)?;
    scenario.obstacle().validate(geometry.distance_m).with_context(ctx)?;
    debug!(name = %scenario.name, hash = compute_scenario_hash(scenario), "scenario accepted");
    Ok((evaluator, link.scene(scenario).config()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(link) => {
            let cache = ClearanceCache::default();
            let mut blocked = 0usize;
            let scenarios = link.scenarios()?;

            for scenario in &scenarios {
                let (evaluator, config) = prepare(&link, scenario)?;

                let result = cache.get_or_evaluate(
                    &evaluator,
                    &config.geometry,
                    &config.obstacle,
                    config.use_curvature,
                );
                if !result.is_clear() {
                    blocked += 1;
                }

                println!("== {}", scenario.name);
                for line in config.status_lines(&result) {
                    println!("{line}");
                }
            }

            let metrics = cache.metrics();
            info!(
                scenarios = scenarios.len(),
                blocked,
                evaluations = metrics.evaluations,
                cache_hits = metrics.cache_hits,
                "check finished"
            );
        }
        Command::Profile { link, points, output } => {
            let scenarios = link.scenarios()?;
            if scenarios.is_empty() {
                warn!("no scenarios to profile");
            }

            for (idx, scenario) in scenarios.iter().enumerate() {
                let (evaluator, config) = prepare(&link, scenario)?;

                let profile = config.profile(&evaluator, points);
                let path = if scenarios.len() == 1 {
                    output.clone()
                } else {
                    suffixed(&output, idx)
                };
                save_profile_csv(&profile, &path)?;
                println!(
                    "{}: F1@mid={:.2} m (60%={:.2} m) -> {}",
                    scenario.name,
                    profile.mid_path_fresnel_radius(),
                    profile.clearance_at_mid(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}

fn suffixed(path: &std::path::Path, idx: usize) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("profile");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    path.with_file_name(format!("{stem}_{idx}.{ext}"))
}
