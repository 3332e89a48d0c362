use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::palette::PALETTE;
use crate::sim_params::SimParams;
use std::path::Path;

// Arena dimensions
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceLawKind {
    /// Signed force with a short-range repulsion cutoff and a long-range radius.
    DualThreshold,
    /// Single-coefficient piecewise curve in normalized coordinates.
    Legacy,
}

// Integration and force scaling for the active force law
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PhysicsConfig {
    #[serde(default = "default_force_law")]
    pub force_law: ForceLawKind,
    pub dt: f32,
    pub friction: f32,
    pub k: f32,
    #[serde(default = "default_particle_size")]
    pub particle_size: u32, // Render hint only
    #[serde(default)]
    pub parallel: bool,
}

// Constants of the legacy force curve
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LegacyConfig {
    #[serde(default = "default_r_max")]
    pub r_max: f32,
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_force_factor")]
    pub force_factor: f32,
    #[serde(default = "default_friction_half_life")]
    pub friction_half_life: f32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SpatialIndexConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Half-extent of the neighbor query box. Falls back to the force law's reach.
    #[serde(default)]
    pub query_radius: Option<f32>,
    /// Also query the box shifted by the world extent so neighbors across the
    /// border are found. Off by default; changes results near the edges.
    #[serde(default)]
    pub wrap_queries: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    Random,
    Center,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyMatrixKind {
    Random,
    Identity,
}

// Initial world and parameter generation
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GenerationConfig {
    pub colors_count: usize,
    pub num_particles: u32,
    pub seed: u64,
    #[serde(default = "default_placement")]
    pub placement: PlacementKind,
    #[serde(default = "default_legacy_matrix")]
    pub legacy_matrix: LegacyMatrixKind,
    #[serde(default = "default_force_magnitude_range")]
    pub force_magnitude_range: [f32; 2],
    #[serde(default = "default_min_distance_range")]
    pub min_distance_range: [f32; 2],
    #[serde(default = "default_radius_range")]
    pub radius_range: [f32; 2],
}

// Configuration for the headless driver loop
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_ticks: u32,
    pub record_interval_ticks: u32,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_snapshots: bool,
    #[serde(default)]
    pub save_positions_in_snapshot: bool,
}

fn default_force_law() -> ForceLawKind {
    ForceLawKind::DualThreshold
}

fn default_particle_size() -> u32 {
    4
}

fn default_r_max() -> f32 {
    0.1
}

fn default_beta() -> f32 {
    0.3
}

fn default_force_factor() -> f32 {
    10.0
}

fn default_friction_half_life() -> f32 {
    0.04
}

fn default_capacity() -> usize {
    4
}

fn default_max_depth() -> u32 {
    12
}

fn default_placement() -> PlacementKind {
    PlacementKind::Random
}

fn default_legacy_matrix() -> LegacyMatrixKind {
    LegacyMatrixKind::Random
}

fn default_force_magnitude_range() -> [f32; 2] {
    [0.3, 1.0]
}

fn default_min_distance_range() -> [f32; 2] {
    [30.0, 50.0]
}

fn default_radius_range() -> [f32; 2] {
    [70.0, 250.0]
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            r_max: default_r_max(),
            beta: default_beta(),
            force_factor: default_force_factor(),
            friction_half_life: default_friction_half_life(),
        }
    }
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        SpatialIndexConfig {
            enabled: false,
            capacity: default_capacity(),
            max_depth: default_max_depth(),
            query_radius: None,
            wrap_queries: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            colors_count: 6,
            num_particles: 0,
            seed: 0,
            placement: default_placement(),
            legacy_matrix: default_legacy_matrix(),
            force_magnitude_range: default_force_magnitude_range(),
            min_distance_range: default_min_distance_range(),
            radius_range: default_radius_range(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { total_ticks: 0, record_interval_ticks: 1 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: String::from("particle_life"),
            save_snapshots: false,
            save_positions_in_snapshot: false,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
    #[serde(default)]
    pub spatial_index: SpatialIndexConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            anyhow::bail!("world width and height must be positive.");
        }
        if !(self.physics.dt > 0.0) {
            anyhow::bail!("physics.dt must be positive.");
        }
        if !(self.physics.friction > 0.0 && self.physics.friction <= 1.0) {
            anyhow::bail!("physics.friction must be in (0, 1], got {}.", self.physics.friction);
        }
        if !self.physics.k.is_finite() {
            anyhow::bail!("physics.k must be finite.");
        }
        if !(self.legacy.r_max > 0.0) {
            anyhow::bail!("legacy.r_max must be positive.");
        }
        if !(self.legacy.beta > 0.0 && self.legacy.beta < 1.0) {
            anyhow::bail!("legacy.beta must be in (0, 1), got {}.", self.legacy.beta);
        }
        if !(self.legacy.friction_half_life > 0.0) {
            anyhow::bail!("legacy.friction_half_life must be positive.");
        }
        if self.spatial_index.capacity == 0 {
            anyhow::bail!("spatial_index.capacity must be at least 1.");
        }
        if let Some(radius) = self.spatial_index.query_radius {
            if !(radius > 0.0) {
                anyhow::bail!("spatial_index.query_radius must be positive when set.");
            }
        }
        if self.generation.colors_count > PALETTE.len() {
            anyhow::bail!(
                "generation.colors_count {} exceeds the palette size of {}.",
                self.generation.colors_count,
                PALETTE.len()
            );
        }
        if self.generation.colors_count == 0 && self.generation.num_particles > 0 {
            anyhow::bail!("generation.num_particles must be 0 when colors_count is 0.");
        }
        for (name, range) in [
            ("force_magnitude_range", self.generation.force_magnitude_range),
            ("min_distance_range", self.generation.min_distance_range),
            ("radius_range", self.generation.radius_range),
        ] {
            if !(range[0] >= 0.0 && range[1] >= range[0]) {
                anyhow::bail!("generation.{} must satisfy 0 <= min <= max, got {:?}.", name, range);
            }
        }
        if self.timing.record_interval_ticks == 0 {
            anyhow::bail!("timing.record_interval_ticks must be at least 1.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            world_width: self.world.width,
            world_height: self.world.height,
            force_law: self.physics.force_law,
            dt: self.physics.dt,
            friction: self.physics.friction,
            k: self.physics.k,
            particle_size: self.physics.particle_size,
            parallel: self.physics.parallel,
            r_max: self.legacy.r_max,
            beta: self.legacy.beta,
            force_factor: self.legacy.force_factor,
            friction_half_life: self.legacy.friction_half_life,
            use_spatial_index: self.spatial_index.enabled,
            index_capacity: self.spatial_index.capacity,
            index_max_depth: self.spatial_index.max_depth,
            query_radius: self.spatial_index.query_radius,
            wrap_queries: self.spatial_index.wrap_queries,
            seed: self.generation.seed,
            tick: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [world]
        width = 1280.0
        height = 960.0

        [physics]
        dt = 0.75
        friction = 0.85
        k = 0.05

        [generation]
        colors_count = 6
        num_particles = 200
        seed = 42
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = SimulationConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.physics.force_law, ForceLawKind::DualThreshold);
        assert_eq!(config.physics.particle_size, 4);
        assert!(!config.physics.parallel);
        assert_eq!(config.spatial_index.capacity, 4);
        assert!(!config.spatial_index.enabled);
        assert!(!config.spatial_index.wrap_queries);
        assert_eq!(config.generation.placement, PlacementKind::Random);
        assert_eq!(config.generation.radius_range, [70.0, 250.0]);
        assert_eq!(config.legacy.beta, 0.3);

        let params = config.get_sim_params();
        assert_eq!(params.world_width, 1280.0);
        assert_eq!(params.tick, 0);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn enum_keys_parse_in_snake_case() {
        let text = MINIMAL.replace("dt = 0.75", "dt = 0.001\nforce_law = \"legacy\"")
            + "\n[spatial_index]\nenabled = true\nwrap_queries = true\nquery_radius = 120.0\n";
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.physics.force_law, ForceLawKind::Legacy);
        assert!(config.spatial_index.enabled);
        assert_eq!(config.spatial_index.query_radius, Some(120.0));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_friction = MINIMAL.replace("friction = 0.85", "friction = 1.5");
        assert!(SimulationConfig::from_toml_str(&bad_friction).is_err());

        let bad_width = MINIMAL.replace("width = 1280.0", "width = 0.0");
        assert!(SimulationConfig::from_toml_str(&bad_width).is_err());

        let too_many_colors = MINIMAL.replace("colors_count = 6", "colors_count = 13");
        assert!(SimulationConfig::from_toml_str(&too_many_colors).is_err());

        let bad_law = MINIMAL.replace("dt = 0.75", "dt = 0.75\nforce_law = \"gravity\"");
        assert!(SimulationConfig::from_toml_str(&bad_law).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimulationConfig::load("definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.toml"));
    }
}
