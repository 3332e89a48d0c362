use serde::{Serialize, Deserialize};

/// Diagnostic summary of the particle store after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks completed when the snapshot was taken.
    pub tick: u64,
    /// Simulated time, `tick * dt` at the time of recording.
    pub time: f32,
    /// The total number of particles in the store.
    pub total_particle_count: u32,
    /// `color_counts[c]` is the number of particles of color `c`.
    pub color_counts: Vec<u32>,
    /// Mean velocity magnitude over all particles (0 for an empty store).
    pub mean_speed: f32,
    pub max_speed: f32,
    /// Raw [x, y] positions, only when `output.save_positions_in_snapshot` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<(f32, f32)>>,
}
