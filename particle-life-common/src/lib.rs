pub mod config;
pub mod matrix;
pub mod palette;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    ForceLawKind, GenerationConfig, LegacyConfig, LegacyMatrixKind, OutputConfig, PhysicsConfig,
    PlacementKind, SimulationConfig, SpatialIndexConfig, TimingConfig, WorldConfig,
};
pub use matrix::{Matrix, MatrixKind, ParameterMatrices};
pub use palette::{species_colors, Rgb, PALETTE};
pub use sim_params::SimParams;
pub use snapshot::Snapshot;
pub use vecmath::{
    angle_to_vec, map_range, minimal_image, minimal_image_coord, random_unit_vector, wrap_coord,
    wrap_toroidal, Vec2,
};
