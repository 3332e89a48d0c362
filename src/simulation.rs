use crate::forces::{force_law_for, ForceContext};
use crate::particle_store::ParticleStore;
use crate::quadtree::{Boundary, QuadPoint, QuadTree};
use anyhow::Result;
use log::{debug, info, trace, warn};
use particle_life_common::{
    species_colors, ForceLawKind, MatrixKind, ParameterMatrices, PlacementKind, Rgb, SimParams,
    SimulationConfig, Snapshot, Vec2,
};
use rand::prelude::*;
use rayon::prelude::*;
use std::time::Instant;

/// Owns the particle world: store, interaction tables, runtime parameters and
/// the host RNG used for placement and regeneration.
pub struct Simulation {
    /// The configuration the world was built from. Generation ranges and output
    /// flags are read from here; runtime values live in `params`.
    config: SimulationConfig,
    params: SimParams,
    matrices: ParameterMatrices,
    species_colors: Vec<Rgb>,
    store: ParticleStore,
    /// Host-side RNG for initial placement and parameter regeneration.
    rng: StdRng,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Creates a world from `config`: generates the interaction tables and places
    /// the initial particles.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.generation.seed);
        let matrices = ParameterMatrices::generate(config.generation.colors_count, &config.generation, &mut rng);

        let mut sim = Self::assemble(config, matrices, rng)?;

        let initial = place_initial_particles(&sim.config, &mut sim.rng);
        for (position, color) in initial {
            sim.store.add_particle(position, color);
        }
        info!(
            "Simulation initialized with {} particles, {} colors, force law '{}'.",
            sim.store.len(),
            sim.matrices.colors_count(),
            force_law_for(sim.params.force_law).name()
        );
        Ok(sim)
    }

    /// Creates an empty world with caller-supplied interaction tables.
    /// The generation section's particle count and color count are ignored.
    pub fn with_matrices(config: SimulationConfig, matrices: ParameterMatrices) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.generation.seed);
        Self::assemble(config, matrices, rng)
    }

    fn assemble(mut config: SimulationConfig, matrices: ParameterMatrices, rng: StdRng) -> Result<Self> {
        let species_colors = species_colors(matrices.colors_count())?;
        config.generation.colors_count = matrices.colors_count();
        let params = config.get_sim_params();
        let store = ParticleStore::with_capacity(config.generation.num_particles as usize);
        Ok(Self {
            config,
            params,
            matrices,
            species_colors,
            store,
            rng,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Advances the world by one tick.
    ///
    /// Every particle's force is computed from the positions at the start of the
    /// tick; results go to the back buffers and are published by a single swap.
    /// An empty store or a world without colors is a no-op apart from the tick counter.
    pub fn tick(&mut self) -> Result<()> {
        let start = Instant::now();
        if !self.store.is_consistent() {
            anyhow::bail!("Particle store buffers out of sync before tick {}.", self.params.tick);
        }

        let count = self.store.len();
        if count > 0 && self.matrices.colors_count() > 0 {
            let law = force_law_for(self.params.force_law);
            let params = &self.params;
            let buffers = self.store.tick_buffers();
            let ctx = ForceContext {
                params,
                matrices: &self.matrices,
                colors: buffers.colors,
                positions: buffers.positions_in,
            };
            let velocities_in = buffers.velocities_in;

            // --- 1. Rebuild the spatial index (optional) ---
            let index = if params.use_spatial_index {
                Some(QuadTree::build(
                    Boundary::arena(params.world_width, params.world_height),
                    params.index_capacity,
                    params.index_max_depth,
                    ctx.positions,
                ))
            } else {
                None
            };
            let query_radius = params.query_radius.unwrap_or_else(|| law.reach(&ctx));

            // --- 2. Forces and integration, one particle at a time ---
            let update = |(i, (position_out, velocity_out)): (usize, (&mut Vec2, &mut Vec2))| {
                let mut rng = particle_rng(params.seed, params.tick, i);
                let total_force = match &index {
                    Some(tree) => {
                        let mut found = Vec::new();
                        gather_neighbors(tree, ctx.positions[i], query_radius, params, &mut found);
                        found
                            .iter()
                            .filter(|p| p.index != i)
                            .fold(Vec2::zero(), |acc, p| acc + law.pair_force(&ctx, i, p.index, &mut rng))
                    }
                    None => (0..count)
                        .filter(|&j| j != i)
                        .fold(Vec2::zero(), |acc, j| acc + law.pair_force(&ctx, i, j, &mut rng)),
                };
                let (position, velocity) = law.integrate(params, ctx.positions[i], velocities_in[i], total_force);
                *position_out = position;
                *velocity_out = velocity;
            };

            if params.parallel {
                buffers
                    .positions_out
                    .par_iter_mut()
                    .zip(buffers.velocities_out.par_iter_mut())
                    .enumerate()
                    .for_each(update);
            } else {
                buffers
                    .positions_out
                    .iter_mut()
                    .zip(buffers.velocities_out.iter_mut())
                    .enumerate()
                    .for_each(update);
            }

            // --- 3. Publish ---
            self.store.swap_buffers();
        }

        self.params.tick += 1;
        trace!(
            "Tick {} ({} particles) in {:.3} ms",
            self.params.tick,
            count,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Appends one particle at rest at world coordinates `(x, y)`.
    /// Rejects unknown colors and coordinates outside the arena.
    pub fn add_particle(&mut self, x: f32, y: f32, color: usize) -> Result<()> {
        let colors_count = self.matrices.colors_count();
        if color >= colors_count {
            warn!("Rejected particle with color {} (colors_count = {}).", color, colors_count);
            anyhow::bail!("Color index {} out of range for {} colors.", color, colors_count);
        }
        let position = Vec2::new(x, y);
        if !position.is_finite()
            || x < 0.0
            || y < 0.0
            || x >= self.params.world_width
            || y >= self.params.world_height
        {
            warn!("Rejected particle at ({}, {}): outside the arena.", x, y);
            anyhow::bail!(
                "Position ({}, {}) outside the {}x{} arena.",
                x, y, self.params.world_width, self.params.world_height
            );
        }
        self.store.add_particle(position, color);
        Ok(())
    }

    /// Removes every particle.
    pub fn clear_particles(&mut self) {
        debug!("Clearing {} particles.", self.store.len());
        self.store.clear();
    }

    /// Replaces all four interaction tables (and the palette) with freshly
    /// generated ones for `colors_count` colors.
    ///
    /// Fails if the palette cannot cover `colors_count`, or if a live particle
    /// uses a color that would no longer exist; clear the particles first in that case.
    pub fn regenerate_parameters(&mut self, colors_count: usize) -> Result<()> {
        let species_colors = species_colors(colors_count)?;
        if let Some(max_color) = self.store.max_color() {
            if max_color >= colors_count {
                anyhow::bail!(
                    "Cannot shrink to {} colors while particles of color {} exist.",
                    colors_count, max_color
                );
            }
        }
        self.config.generation.colors_count = colors_count;
        self.matrices = ParameterMatrices::generate(colors_count, &self.config.generation, &mut self.rng);
        self.species_colors = species_colors;
        info!("Regenerated interaction parameters for {} colors.", colors_count);
        Ok(())
    }

    /// Builds a snapshot of the current store without recording it.
    pub fn snapshot(&self) -> Snapshot {
        let colors_count = self.matrices.colors_count();
        let mut color_counts = vec![0u32; colors_count];
        for &c in self.store.colors() {
            if let Some(slot) = color_counts.get_mut(c) {
                *slot += 1;
            }
        }

        let speeds = self.store.velocities().iter().map(Vec2::length);
        let (sum, max) = speeds.fold((0.0f32, 0.0f32), |(sum, max), s| (sum + s, max.max(s)));
        let count = self.store.len();
        let mean_speed = if count > 0 { sum / count as f32 } else { 0.0 };

        let positions = if self.config.output.save_positions_in_snapshot {
            Some(self.store.positions().iter().map(|p| (p.x, p.y)).collect())
        } else {
            None
        };

        Snapshot {
            tick: self.params.tick,
            time: self.params.tick as f32 * self.params.dt,
            total_particle_count: count as u32,
            color_counts,
            mean_speed,
            max_speed: max,
            positions,
        }
    }

    /// Records a snapshot of the current state.
    pub fn record_snapshot(&mut self) {
        let snapshot = self.snapshot();
        debug!(
            "Recorded snapshot at tick {}: {} particles, mean speed {:.4}.",
            snapshot.tick, snapshot.total_particle_count, snapshot.mean_speed
        );
        self.recorded_snapshots.push(snapshot);
    }

    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.store
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    pub fn current_tick(&self) -> u64 {
        self.params.tick
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn matrices(&self) -> &ParameterMatrices {
        &self.matrices
    }

    /// Edits one interaction table entry between ticks. Table sizes only change
    /// through [`Simulation::regenerate_parameters`].
    pub fn set_matrix_entry(&mut self, kind: MatrixKind, a: usize, b: usize, value: f32) -> Result<()> {
        self.matrices.set_entry(kind, a, b, value).map_err(|e| {
            warn!("Rejected {:?} entry ({}, {}) = {}: {}", kind, a, b, value, e);
            e
        })
    }

    // --- Runtime controls ---
    // The world size, seed and tick counter are fixed by construction.

    pub fn set_force_law(&mut self, force_law: ForceLawKind) {
        debug!("Force law set to {:?}.", force_law);
        self.params.force_law = force_law;
    }

    pub fn set_dt(&mut self, dt: f32) -> Result<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            anyhow::bail!("dt must be positive and finite, got {}.", dt);
        }
        self.params.dt = dt;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f32) -> Result<()> {
        if !(friction > 0.0 && friction <= 1.0) {
            anyhow::bail!("friction must be in (0, 1], got {}.", friction);
        }
        self.params.friction = friction;
        Ok(())
    }

    pub fn set_k(&mut self, k: f32) -> Result<()> {
        if !k.is_finite() {
            anyhow::bail!("k must be finite, got {}.", k);
        }
        self.params.k = k;
        Ok(())
    }

    pub fn set_particle_size(&mut self, particle_size: u32) {
        self.params.particle_size = particle_size;
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.params.parallel = parallel;
    }

    /// Sets the legacy curve's cutoff, as a fraction of the arena.
    pub fn set_r_max(&mut self, r_max: f32) -> Result<()> {
        if !(r_max > 0.0 && r_max.is_finite()) {
            anyhow::bail!("r_max must be positive and finite, got {}.", r_max);
        }
        self.params.r_max = r_max;
        Ok(())
    }

    pub fn set_beta(&mut self, beta: f32) -> Result<()> {
        if !(beta > 0.0 && beta < 1.0) {
            anyhow::bail!("beta must be in (0, 1), got {}.", beta);
        }
        self.params.beta = beta;
        Ok(())
    }

    pub fn set_force_factor(&mut self, force_factor: f32) -> Result<()> {
        if !force_factor.is_finite() {
            anyhow::bail!("force_factor must be finite, got {}.", force_factor);
        }
        self.params.force_factor = force_factor;
        Ok(())
    }

    pub fn set_friction_half_life(&mut self, half_life: f32) -> Result<()> {
        if !(half_life > 0.0 && half_life.is_finite()) {
            anyhow::bail!("friction_half_life must be positive and finite, got {}.", half_life);
        }
        self.params.friction_half_life = half_life;
        Ok(())
    }

    pub fn set_spatial_index(&mut self, enabled: bool) {
        self.params.use_spatial_index = enabled;
    }

    /// `None` falls back to the force law's reach.
    pub fn set_query_radius(&mut self, radius: Option<f32>) -> Result<()> {
        if let Some(r) = radius {
            if !(r > 0.0 && r.is_finite()) {
                anyhow::bail!("query_radius must be positive and finite, got {}.", r);
            }
        }
        self.params.query_radius = radius;
        Ok(())
    }

    pub fn set_wrap_queries(&mut self, wrap_queries: bool) {
        self.params.wrap_queries = wrap_queries;
    }

    /// Display color of each species.
    pub fn species_colors(&self) -> &[Rgb] {
        &self.species_colors
    }

    pub fn particle_size(&self) -> u32 {
        self.params.particle_size
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

/// Deterministic per-particle RNG, independent of iteration order and thread count.
#[inline(always)]
fn particle_rng(seed: u64, tick: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(
        seed.wrapping_add(tick.wrapping_mul(1 << 32))
            .wrapping_add(index as u64),
    )
}

/// Collects the index points inside the square of half-extent `radius` around `center`.
///
/// The box is not toroidal: near the border it misses neighbors on the far side
/// unless `wrap_queries` is set, in which case the box is also queried shifted by
/// the world extent and duplicates are removed.
fn gather_neighbors(tree: &QuadTree, center: Vec2, radius: f32, params: &SimParams, found: &mut Vec<QuadPoint>) {
    let range = Boundary::new(center, radius, radius);
    tree.query(&range, found);

    if params.wrap_queries {
        let (w, h) = (params.world_width, params.world_height);
        for dx in [-w, 0.0, w] {
            for dy in [-h, 0.0, h] {
                if dx == 0.0 && dy == 0.0 {
                    continue;
                }
                let shifted = range.translated(Vec2::new(dx, dy));
                if shifted.intersects(tree.boundary()) {
                    tree.query(&shifted, found);
                }
            }
        }
        found.sort_unstable_by_key(|p| p.index);
        found.dedup_by_key(|p| p.index);
    }
}

/// Generates the initial particles according to the `[generation]` section.
fn place_initial_particles(config: &SimulationConfig, rng: &mut StdRng) -> Vec<(Vec2, usize)> {
    let generation = &config.generation;
    let (w, h) = (config.world.width, config.world.height);
    if generation.colors_count == 0 {
        return Vec::new();
    }

    (0..generation.num_particles)
        .map(|_| {
            let color = rng.random_range(0..generation.colors_count);
            let position = match generation.placement {
                PlacementKind::Random => Vec2::new(rng.random_range(0.0..w), rng.random_range(0.0..h)),
                PlacementKind::Center => Vec2::new(w * 0.5, h * 0.5),
            };
            (position, color)
        })
        .collect()
}
