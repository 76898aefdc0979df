use fresnel_clearance::cache::ClearanceCache;
use fresnel_clearance::physics::clearance::ClearanceEvaluator;
use fresnel_clearance::scene::{SceneCommand, SceneState};

// Raise both masts until the default scene clears, the way a user would with the keys.
fn main() {
    let evaluator = ClearanceEvaluator::default();
    let cache = ClearanceCache::default();
    let mut scene = SceneState::default();

    for frame in 0..400 {
        let config = scene.config();
        let res = cache.get_or_evaluate(&evaluator, &config.geometry, &config.obstacle, config.use_curvature);
        if res.is_clear() {
            println!("clear after {} frames", frame);
            for line in config.status_lines(&res) {
                println!("  {}", line);
            }
            break;
        }
        // Every other frame is idle and served from the cache
        if frame % 2 == 0 {
            scene.apply(SceneCommand::TxUp);
            scene.apply(SceneCommand::RxUp);
        }
    }

    let metrics = cache.metrics();
    println!("evaluations: {}, cache hits: {}", metrics.evaluations, metrics.cache_hits);
}
