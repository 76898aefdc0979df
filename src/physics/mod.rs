pub mod clearance;
pub mod profile;
pub mod refraction;
pub mod wave;
