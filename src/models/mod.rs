//! Core data models for the playlist planner.

mod ids;
mod plan;
mod playlist;
mod settings;
mod stats;
mod video;

pub use ids::*;
pub use plan::*;
pub use playlist::*;
pub use settings::*;
pub use stats::*;
pub use video::*;
