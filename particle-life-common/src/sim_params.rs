use crate::config::ForceLawKind;
use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, read by every tick.
/// Changed between ticks only through the simulation's validated setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // World
    pub world_width: f32,
    pub world_height: f32,

    // Integration
    pub force_law: ForceLawKind,
    pub dt: f32,
    pub friction: f32, // Velocity decay per tick, (0, 1]
    pub k: f32,        // Global force scale
    pub particle_size: u32,
    pub parallel: bool,

    // Legacy force curve
    pub r_max: f32, // Interaction radius as a fraction of the arena
    pub beta: f32,
    pub force_factor: f32,
    pub friction_half_life: f32,

    // Spatial index
    pub use_spatial_index: bool,
    pub index_capacity: usize,
    pub index_max_depth: u32,
    pub query_radius: Option<f32>,
    pub wrap_queries: bool,

    // Randomness & time
    pub seed: u64,
    pub tick: u64, // Current simulation tick number
}

impl SimParams {
    /// Per-tick velocity decay of the legacy law: half of the velocity is lost
    /// every `friction_half_life` time units. Derived on demand so it follows `dt`.
    pub fn legacy_friction_factor(&self) -> f32 {
        0.5f32.powf(self.dt / self.friction_half_life)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimulationConfig;

    #[test]
    fn legacy_friction_follows_dt() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [world]
            width = 1.0
            height = 1.0
            [physics]
            dt = 0.04
            friction = 1.0
            k = 1.0
            [generation]
            colors_count = 1
            num_particles = 0
            seed = 0
            "#,
        )
        .unwrap();
        let mut params = config.get_sim_params();
        // dt equal to the half-life halves the velocity
        assert!((params.legacy_friction_factor() - 0.5).abs() < 1e-6);
        params.dt = 0.08;
        assert!((params.legacy_friction_factor() - 0.25).abs() < 1e-6);
    }
}
