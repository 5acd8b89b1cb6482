pub mod angle;
pub mod band;
pub mod project;

pub use angle::bearing_from_id;
pub use band::band_for_signal;
pub use project::polar_to_cartesian;
