use particle_life_common::{ParameterMatrices, SimulationConfig, Vec2};
use particle_life_engine::Simulation;

fn config(physics: &str, extra: &str) -> SimulationConfig {
    let text = format!(
        "[world]\nwidth = 100.0\nheight = 100.0\n\
         [physics]\n{}\n\
         [generation]\ncolors_count = 2\nnum_particles = 0\nseed = 11\n{}",
        physics, extra
    );
    SimulationConfig::from_toml_str(&text).unwrap()
}

fn unit_physics() -> &'static str {
    "dt = 1.0\nfriction = 1.0\nk = 1.0"
}

#[test]
fn close_pair_is_pushed_apart() {
    let mut sim = Simulation::with_matrices(
        config(unit_physics(), ""),
        ParameterMatrices::uniform(2, -1.0, 15.0, 15.0, 0.0),
    )
    .unwrap();
    sim.add_particle(10.0, 50.0, 0).unwrap();
    sim.add_particle(20.0, 50.0, 0).unwrap();

    sim.tick().unwrap();

    let p = sim.particles().positions();
    assert!(p[1].x - p[0].x > 10.0);
    assert!(p[0].x < 10.0);
    assert!(p[1].x > 20.0);
    assert!((p[0].y - 50.0).abs() < 1e-5);
    assert!((p[1].y - 50.0).abs() < 1e-5);
}

#[test]
fn lone_particle_stays_put_under_both_laws() {
    for law in ["dual_threshold", "legacy"] {
        let physics = format!("force_law = \"{}\"\ndt = 0.02\nfriction = 0.9\nk = 1.0", law);
        let mut sim = Simulation::with_matrices(
            config(&physics, ""),
            ParameterMatrices::uniform(2, 1.0, 10.0, 30.0, 1.0),
        )
        .unwrap();
        sim.add_particle(42.5, 17.25, 1).unwrap();
        for _ in 0..10 {
            sim.tick().unwrap();
        }
        assert_eq!(sim.particles().positions()[0], Vec2::new(42.5, 17.25), "law {}", law);
        assert_eq!(sim.particles().velocities()[0], Vec2::zero(), "law {}", law);
    }
}

#[test]
fn empty_world_ticks_without_effect() {
    let mut sim = Simulation::with_matrices(
        config(unit_physics(), ""),
        ParameterMatrices::uniform(2, 1.0, 10.0, 30.0, 0.0),
    )
    .unwrap();
    for _ in 0..3 {
        sim.tick().unwrap();
    }
    assert_eq!(sim.particle_count(), 0);
    assert_eq!(sim.current_tick(), 3);
}

#[test]
fn parallel_and_sequential_ticks_agree() {
    let text = |parallel: bool| {
        format!(
            "[world]\nwidth = 400.0\nheight = 300.0\n\
             [physics]\ndt = 0.5\nfriction = 0.85\nk = 0.05\nparallel = {}\n\
             [generation]\ncolors_count = 5\nnum_particles = 300\nseed = 2024\n",
            parallel
        )
    };
    let mut sequential = Simulation::new(SimulationConfig::from_toml_str(&text(false)).unwrap()).unwrap();
    let mut parallel = Simulation::new(SimulationConfig::from_toml_str(&text(true)).unwrap()).unwrap();

    for _ in 0..10 {
        sequential.tick().unwrap();
        parallel.tick().unwrap();
    }
    assert_eq!(sequential.particles().positions(), parallel.particles().positions());
    assert_eq!(sequential.particles().velocities(), parallel.particles().velocities());
}

#[test]
fn wrapped_index_matches_brute_force_near_edges() {
    let matrices = ParameterMatrices::uniform(2, 0.6, 5.0, 20.0, 0.0);
    let seeds = [
        (2.0, 50.0, 0),
        (97.0, 50.0, 1),
        (50.0, 1.0, 0),
        (50.0, 98.5, 1),
        (1.0, 1.0, 1),
        (99.0, 99.0, 0),
        (45.0, 45.0, 0),
        (52.0, 47.0, 1),
    ];
    let build = |extra: &str| {
        let mut sim = Simulation::with_matrices(config("dt = 0.5\nfriction = 0.9\nk = 1.0", extra), matrices.clone()).unwrap();
        for &(x, y, c) in &seeds {
            sim.add_particle(x, y, c).unwrap();
        }
        sim
    };

    let mut brute = build("");
    let mut indexed = build("[spatial_index]\nenabled = true\ncapacity = 2\nwrap_queries = true\n");
    for _ in 0..5 {
        brute.tick().unwrap();
        indexed.tick().unwrap();
    }

    let pairs = brute.particles().positions().iter().zip(indexed.particles().positions());
    for (a, b) in pairs {
        assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4, "{:?} vs {:?}", a, b);
    }
}

#[test]
fn unwrapped_index_misses_pairs_across_the_border() {
    let matrices = ParameterMatrices::uniform(1, 1.0, 0.0, 20.0, 0.0);
    let build = |extra: &str| {
        let mut sim = Simulation::with_matrices(config(unit_physics(), extra), matrices.clone()).unwrap();
        sim.add_particle(2.0, 50.0, 0).unwrap();
        sim.add_particle(97.0, 50.0, 0).unwrap();
        sim
    };

    let mut brute = build("");
    let mut indexed = build("[spatial_index]\nenabled = true\nquery_radius = 20.0\n");
    brute.tick().unwrap();
    indexed.tick().unwrap();

    assert!(brute.particles().velocities()[0].length() > 0.0);
    assert_eq!(indexed.particles().velocities()[0], Vec2::zero());
    assert_eq!(indexed.particles().positions()[0], Vec2::new(2.0, 50.0));
}

#[test]
fn legacy_run_stays_finite_and_inside_the_arena() {
    let text = "[world]\nwidth = 250.0\nheight = 200.0\n\
                [physics]\nforce_law = \"legacy\"\ndt = 0.02\nfriction = 0.85\nk = 1.0\n\
                [spatial_index]\nenabled = true\n\
                [generation]\ncolors_count = 4\nnum_particles = 200\nseed = 8\nlegacy_matrix = \"random\"\n";
    let mut sim = Simulation::new(SimulationConfig::from_toml_str(text).unwrap()).unwrap();
    for _ in 0..25 {
        sim.tick().unwrap();
    }
    for p in sim.particles().positions() {
        assert!(p.is_finite());
        assert!(p.x >= 0.0 && p.x < 250.0 && p.y >= 0.0 && p.y < 200.0, "{:?}", p);
    }
    assert!(sim.particles().velocities().iter().all(|v| v.is_finite()));
}

#[test]
fn recorded_snapshots_serialize_to_json() {
    let mut sim = Simulation::with_matrices(
        config(unit_physics(), "[output]\nbase_filename = \"t\"\nsave_snapshots = true\n"),
        ParameterMatrices::uniform(2, -1.0, 15.0, 15.0, 0.0),
    )
    .unwrap();
    sim.add_particle(10.0, 50.0, 0).unwrap();
    sim.record_snapshot();
    sim.tick().unwrap();
    sim.record_snapshot();

    let json = serde_json::to_string(sim.recorded_snapshots()).unwrap();
    assert!(json.contains("\"tick\":1"));
    assert!(!json.contains("positions"));
}
