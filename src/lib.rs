pub mod forces;
pub mod particle_store;
pub mod quadtree;
pub mod shared;
pub mod simulation;

pub use forces::{force_law_for, legacy_force, DualThresholdLaw, ForceContext, ForceLaw, LegacyLaw};
pub use particle_store::ParticleStore;
pub use quadtree::{Boundary, QuadPoint, QuadTree};
pub use shared::SharedSimulation;
pub use simulation::Simulation;
