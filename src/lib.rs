pub mod error;
pub mod geo;
pub mod io;
pub mod physics;
pub mod scene;
pub mod cache;


pub use error::ClearanceError;
pub use physics::clearance::{ClearanceEvaluator, ClearanceResult, LinkGeometry, Obstacle};
pub use physics::refraction::RefractionParams;
