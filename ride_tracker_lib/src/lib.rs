pub mod clock;
pub mod configuration;
pub mod error;
pub mod format;
pub mod geo_sample;
pub mod insights;
pub mod map_path;
pub mod position;
pub mod recorder;
pub mod route_list;
pub mod service;
pub mod trip;

pub use error::*;
