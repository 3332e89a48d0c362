use particle_life_common::{
    map_range, minimal_image, random_unit_vector, wrap_toroidal, ForceLawKind, ParameterMatrices,
    SimParams, Vec2,
};
use rand::rngs::StdRng;

/// Wrap threshold of the legacy law, in normalized arena units.
const LEGACY_WRAP_THRESHOLD: f32 = 0.9;

/// Everything a force law may read while computing one tick.
/// All slices are the pre-tick (front) buffers.
pub struct ForceContext<'a> {
    pub params: &'a SimParams,
    pub matrices: &'a ParameterMatrices,
    pub colors: &'a [usize],
    pub positions: &'a [Vec2],
}

/// A pairwise interaction rule plus the integration step that goes with it.
pub trait ForceLaw: Send + Sync {
    fn name(&self) -> &'static str;

    /// Largest world distance at which any color pair can still interact.
    /// Used as the default half-extent of spatial index queries.
    fn reach(&self, ctx: &ForceContext) -> f32;

    /// Contribution of particle `j` to the force acting on particle `i`.
    /// `rng` supplies a direction when the two particles coincide.
    fn pair_force(&self, ctx: &ForceContext, i: usize, j: usize, rng: &mut StdRng) -> Vec2;

    /// Advances one particle given the summed pair forces.
    /// Returns the new `(position, velocity)`.
    fn integrate(&self, params: &SimParams, position: Vec2, velocity: Vec2, total_force: Vec2) -> (Vec2, Vec2);
}

/// Returns the strategy selected by `kind`.
pub fn force_law_for(kind: ForceLawKind) -> &'static dyn ForceLaw {
    match kind {
        ForceLawKind::DualThreshold => &DualThresholdLaw,
        ForceLawKind::Legacy => &LegacyLaw,
    }
}

/// Signed force with two cutoffs: strong repulsion inside `min_distances[a][b]`
/// and a linearly fading signed force inside `radii[a][b]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DualThresholdLaw;

impl DualThresholdLaw {
    /// Short-range repulsion factor. Always `<= 0`, falls linearly from
    /// `-3 * |force| * k` at zero distance to exactly 0 at `min_distance`.
    #[inline(always)]
    pub fn repulsion_factor(distance: f32, force: f32, min_distance: f32, k: f32) -> f32 {
        if distance < min_distance {
            -3.0 * force.abs() * map_range(distance, 0.0, min_distance, 1.0, 0.0) * k
        } else {
            0.0
        }
    }

    /// Long-range signed factor. Positive attracts, negative repels.
    #[inline(always)]
    pub fn interaction_factor(distance: f32, force: f32, radius: f32, k: f32) -> f32 {
        if distance < radius {
            force * map_range(distance, 0.0, radius, 1.0, 0.0) * k
        } else {
            0.0
        }
    }
}

impl ForceLaw for DualThresholdLaw {
    fn name(&self) -> &'static str {
        "dual_threshold"
    }

    fn reach(&self, ctx: &ForceContext) -> f32 {
        ctx.matrices.radii().max_value().max(ctx.matrices.min_distances().max_value())
    }

    fn pair_force(&self, ctx: &ForceContext, i: usize, j: usize, rng: &mut StdRng) -> Vec2 {
        let params = ctx.params;
        let offset = minimal_image(
            ctx.positions[j] - ctx.positions[i],
            params.world_width,
            params.world_height,
        );
        let distance = offset.length();

        let (c1, c2) = (ctx.colors[i], ctx.colors[j]);
        let force = ctx.matrices.forces().get(c1, c2);
        let factor = Self::repulsion_factor(distance, force, ctx.matrices.min_distances().get(c1, c2), params.k)
            + Self::interaction_factor(distance, force, ctx.matrices.radii().get(c1, c2), params.k);
        if factor == 0.0 {
            return Vec2::zero();
        }

        let direction = if distance > 0.0 { offset / distance } else { random_unit_vector(rng) };
        direction * factor
    }

    fn integrate(&self, params: &SimParams, position: Vec2, velocity: Vec2, total_force: Vec2) -> (Vec2, Vec2) {
        let velocity = velocity * params.friction + total_force * params.dt;
        let position = wrap_toroidal(position + velocity, params.world_width, params.world_height);
        (position, velocity)
    }
}

/// Piecewise single-coefficient curve, evaluated on the pair distance normalized by `r_max`.
/// Below `beta` the pair always repels; between `beta` and 1 it follows a tent
/// whose peak is `attraction`.
#[inline(always)]
pub fn legacy_force(r: f32, attraction: f32, beta: f32) -> f32 {
    if r < beta {
        r / beta - 1.0
    } else if r < 1.0 {
        attraction * (1.0 - (2.0 * r - 1.0 - beta).abs() / (1.0 - beta))
    } else {
        0.0
    }
}

#[inline(always)]
fn legacy_wrap(d: f32) -> f32 {
    if d > LEGACY_WRAP_THRESHOLD {
        d - 1.0
    } else if d < -LEGACY_WRAP_THRESHOLD {
        d + 1.0
    } else {
        d
    }
}

/// The older normalized-space law. Distances are measured in arena fractions,
/// velocities are stored in arena fractions per unit time.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyLaw;

impl ForceLaw for LegacyLaw {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn reach(&self, ctx: &ForceContext) -> f32 {
        ctx.params.r_max * ctx.params.world_width.max(ctx.params.world_height)
    }

    fn pair_force(&self, ctx: &ForceContext, i: usize, j: usize, _rng: &mut StdRng) -> Vec2 {
        let params = ctx.params;
        let raw = ctx.positions[j] - ctx.positions[i];
        let offset = Vec2::new(
            legacy_wrap(raw.x / params.world_width),
            legacy_wrap(raw.y / params.world_height),
        );
        let r = offset.length();
        if r > 0.0 && r < params.r_max {
            let attraction = ctx.matrices.legacy().get(ctx.colors[i], ctx.colors[j]);
            let f = legacy_force(r / params.r_max, attraction, params.beta);
            offset / r * f
        } else {
            Vec2::zero()
        }
    }

    fn integrate(&self, params: &SimParams, position: Vec2, velocity: Vec2, total_force: Vec2) -> (Vec2, Vec2) {
        let total_force = total_force * (params.r_max * params.force_factor);
        let velocity = velocity * params.legacy_friction_factor() + total_force * params.dt;
        let step = velocity * params.dt;
        let displacement = Vec2::new(step.x * params.world_width, step.y * params.world_height);
        let position = wrap_toroidal(position + displacement, params.world_width, params.world_height);
        (position, velocity)
    }
}
