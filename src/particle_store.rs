use particle_life_common::Vec2;

/// Holds per-particle state. Index `i` names the same particle in every buffer,
/// and the buffers only change length together through `add_particle` / `clear`.
#[derive(Debug, Default, Clone)]
pub struct ParticleStore {
    colors: Vec<usize>,

    // --- Ping-Pong Buffers ---
    // Front buffers hold the state of the last completed tick and are what readers see.
    positions_in: Vec<Vec2>,
    velocities_in: Vec<Vec2>,
    // Back buffers receive the next tick's state, then get swapped to the front.
    positions_out: Vec<Vec2>,
    velocities_out: Vec<Vec2>,
}

/// Read-only view of the front buffers plus mutable back buffers, handed to a
/// tick so every force reads pre-tick positions.
pub struct TickBuffers<'a> {
    pub colors: &'a [usize],
    pub positions_in: &'a [Vec2],
    pub velocities_in: &'a [Vec2],
    pub positions_out: &'a mut [Vec2],
    pub velocities_out: &'a mut [Vec2],
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with room for `capacity` particles before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            colors: Vec::with_capacity(capacity),
            positions_in: Vec::with_capacity(capacity),
            velocities_in: Vec::with_capacity(capacity),
            positions_out: Vec::with_capacity(capacity),
            velocities_out: Vec::with_capacity(capacity),
        }
    }

    /// Appends a particle at rest. Color range and coordinates are validated by the caller.
    pub fn add_particle(&mut self, position: Vec2, color: usize) {
        self.colors.push(color);
        self.positions_in.push(position);
        self.velocities_in.push(Vec2::zero());
        // Back buffers are overwritten every tick; they only need the right length.
        self.positions_out.push(position);
        self.velocities_out.push(Vec2::zero());
    }

    /// Removes every particle.
    pub fn clear(&mut self) {
        self.colors.clear();
        self.positions_in.clear();
        self.velocities_in.clear();
        self.positions_out.clear();
        self.velocities_out.clear();
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[usize] {
        &self.colors
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions_in
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities_in
    }

    /// Iterates `(position, color)` pairs for rendering.
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, usize)> + '_ {
        self.positions_in.iter().copied().zip(self.colors.iter().copied())
    }

    /// Largest color index in use, if any particle exists.
    pub fn max_color(&self) -> Option<usize> {
        self.colors.iter().copied().max()
    }

    /// True when every buffer has the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.colors.len();
        self.positions_in.len() == n
            && self.velocities_in.len() == n
            && self.positions_out.len() == n
            && self.velocities_out.len() == n
    }

    /// Splits the store into front (read) and back (write) halves for one tick.
    pub fn tick_buffers(&mut self) -> TickBuffers<'_> {
        TickBuffers {
            colors: &self.colors,
            positions_in: &self.positions_in,
            velocities_in: &self.velocities_in,
            positions_out: &mut self.positions_out,
            velocities_out: &mut self.velocities_out,
        }
    }

    /// Swaps the input and output buffers, publishing the tick just computed.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.positions_in, &mut self.positions_out);
        std::mem::swap(&mut self.velocities_in, &mut self.velocities_out);
    }
}
