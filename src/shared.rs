use crate::simulation::Simulation;
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// A simulation shared between an input thread and the tick loop.
///
/// Every operation holds one lock for its whole duration, so particles are
/// added or cleared strictly before or after a tick, never in the middle of one.
#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<Simulation>>,
}

impl SharedSimulation {
    pub fn new(simulation: Simulation) -> Self {
        SharedSimulation { inner: Arc::new(Mutex::new(simulation)) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Simulation>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("Simulation lock poisoned by a panicking thread."))
    }

    pub fn tick(&self) -> Result<()> {
        self.lock()?.tick()
    }

    pub fn add_particle(&self, x: f32, y: f32, color: usize) -> Result<()> {
        self.lock()?.add_particle(x, y, color)
    }

    pub fn clear_particles(&self) -> Result<()> {
        self.lock()?.clear_particles();
        Ok(())
    }

    pub fn regenerate_parameters(&self, colors_count: usize) -> Result<()> {
        self.lock()?.regenerate_parameters(colors_count)
    }

    /// Runs `f` with read access, e.g. to copy out positions for drawing.
    pub fn read<R>(&self, f: impl FnOnce(&Simulation) -> R) -> Result<R> {
        let guard = self.lock()?;
        Ok(f(&*guard))
    }

    /// Runs `f` with write access, e.g. to call the validated setters between ticks.
    pub fn update<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut *guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_life_common::{MatrixKind, ParameterMatrices, SimulationConfig};
    use std::thread;

    fn shared() -> SharedSimulation {
        let config = SimulationConfig::from_toml_str(
            "[world]\nwidth = 100.0\nheight = 100.0\n\
             [physics]\ndt = 1.0\nfriction = 0.9\nk = 1.0\n\
             [generation]\ncolors_count = 2\nnum_particles = 0\nseed = 1\n",
        )
        .unwrap();
        let sim = Simulation::with_matrices(config, ParameterMatrices::uniform(2, -0.5, 5.0, 10.0, 0.0)).unwrap();
        SharedSimulation::new(sim)
    }

    #[test]
    fn input_thread_and_ticks_interleave_safely() {
        let sim = shared();
        let input = sim.clone();
        let producer = thread::spawn(move || {
            for i in 0..200 {
                let x = (i % 100) as f32;
                let y = ((i * 7) % 100) as f32;
                input.add_particle(x, y, i % 2).unwrap();
            }
        });

        for _ in 0..50 {
            sim.tick().unwrap();
        }
        producer.join().unwrap();
        sim.tick().unwrap();

        let (count, consistent) = sim.read(|s| (s.particle_count(), s.particles().is_consistent())).unwrap();
        assert_eq!(count, 200);
        assert!(consistent);
        assert_eq!(sim.read(|s| s.current_tick()).unwrap(), 51);
    }

    #[test]
    fn update_edits_parameters_between_ticks() {
        let sim = shared();
        sim.update(|s| s.set_k(2.0)).unwrap().unwrap();
        assert_eq!(sim.read(|s| s.params().k).unwrap(), 2.0);
        assert!(sim.update(|s| s.set_friction(0.0)).unwrap().is_err());
        assert!(sim.update(|s| s.set_matrix_entry(MatrixKind::Forces, 2, 2, 1.0)).unwrap().is_err());
        assert_eq!(sim.read(|s| s.matrices().colors_count()).unwrap(), 2);
        sim.add_particle(1.0, 1.0, 0).unwrap();
        sim.clear_particles().unwrap();
        assert_eq!(sim.read(|s| s.particle_count()).unwrap(), 0);
        assert!(sim.regenerate_parameters(3).is_ok());
    }
}
