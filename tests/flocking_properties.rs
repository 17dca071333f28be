// Whole-flock properties of the steering and integration passes

use approx::assert_relative_eq;
use boids::physics::{steering_components, NeighborSums};
use boids::{
    compute_steering, spawn_flock, Boid, BoundaryPolicy, FlockSimulator, SimulationParams, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPSILON: f32 = 1e-5;

// A dense flock so most boids have several neighbors
fn crowded_flock(count: usize, seed: u64) -> (Vec<Boid>, SimulationParams) {
    let params = SimulationParams {
        num_boids: count,
        spawn_radius: 8.0,
        initial_speed: 3.0,
        ..Default::default()
    };
    let flock = spawn_flock(&params, &mut StdRng::seed_from_u64(seed));
    (flock, params)
}

#[test]
fn no_boid_is_its_own_neighbor() {
    let (flock, params) = crowded_flock(40, 1);

    for i in 0..flock.len() {
        let with_self = NeighborSums::gather(&flock, i, params.perception_radius, 0..flock.len());
        let without_self = NeighborSums::gather(
            &flock,
            i,
            params.perception_radius,
            (0..flock.len()).filter(|&j| j != i),
        );
        assert_eq!(with_self, without_self);

        let expected = flock
            .iter()
            .enumerate()
            .filter(|&(j, other)| {
                let d = flock[i].position.distance(other.position);
                j != i && d > 0.0 && d < params.perception_radius
            })
            .count();
        assert_eq!(with_self.count, expected);
    }
}

#[test]
fn each_rule_respects_max_force() {
    let (flock, params) = crowded_flock(80, 2);

    for i in 0..flock.len() {
        let forces = steering_components(&flock, i, &params);
        assert!(forces.separation.length() <= params.max_force + EPSILON);
        assert!(forces.alignment.length() <= params.max_force + EPSILON);
        assert!(forces.cohesion.length() <= params.max_force + EPSILON);
    }
}

#[test]
fn speed_never_exceeds_max_speed() {
    let mut rng = StdRng::seed_from_u64(3);
    let max_speed = 4.0;

    for _ in 0..500 {
        let mut boid = Boid::new(
            0,
            Vec3::ZERO,
            Vec3::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0))
                .clamp_length_max(max_speed),
        );
        let acceleration = Vec3::new(
            rng.gen_range(-1.0e4..1.0e4),
            rng.gen_range(-1.0e4..1.0e4),
            rng.gen_range(-1.0e4..1.0e4),
        );
        boid.integrate(acceleration, rng.gen_range(0.001..1.0), max_speed);
        assert!(boid.velocity.length() <= max_speed + EPSILON);
    }
}

#[test]
fn isolated_boid_drifts_inertially() {
    let params = SimulationParams::default();
    let velocity = Vec3::new(1.0, -0.5, 2.0);
    let mut flock = vec![
        Boid::new(0, Vec3::ZERO, velocity),
        Boid::new(1, Vec3::new(12.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0)),
    ];

    let forces = compute_steering(&flock, &params);
    assert_eq!(forces[0], Vec3::ZERO);

    let mut sim = FlockSimulator::new(params).expect("valid parameters");
    sim.step(&mut flock, 0.25);

    assert_eq!(flock[0].velocity, velocity);
    assert_eq!(flock[0].position, velocity * 0.25);
}

#[test]
fn steering_does_not_depend_on_iteration_order() {
    let (flock, params) = crowded_flock(30, 4);
    let forward = compute_steering(&flock, &params);

    let mut shuffled = flock.clone();
    shuffled.reverse();
    shuffled.swap(3, 17);
    let permuted = compute_steering(&shuffled, &params);

    for (boid, force) in shuffled.iter().zip(&permuted) {
        let reference = forward[boid.id];
        assert_relative_eq!(force.x, reference.x, epsilon = EPSILON);
        assert_relative_eq!(force.y, reference.y, epsilon = EPSILON);
        assert_relative_eq!(force.z, reference.z, epsilon = EPSILON);
    }
}

#[test]
fn step_reads_a_consistent_snapshot() {
    let (mut flock, params) = crowded_flock(25, 5);
    let dt = 0.1;

    // Reference: every force from the untouched snapshot, then integrate
    let snapshot = flock.clone();
    let forces = compute_steering(&snapshot, &params);
    let mut expected = snapshot.clone();
    for (boid, force) in expected.iter_mut().zip(&forces) {
        boid.integrate(*force, dt, params.max_speed);
        params.boundary.apply(boid);
    }

    let mut sim = FlockSimulator::new(params.clone()).expect("valid parameters");
    sim.step(&mut flock, dt);

    for (actual, expected) in flock.iter().zip(&expected) {
        assert_eq!(actual.position, expected.position);
        assert_eq!(actual.velocity, expected.velocity);
    }

    // Interleaving force computation with integration gives a different flock
    let mut interleaved = snapshot;
    for i in 0..interleaved.len() {
        let force = steering_components(&interleaved, i, &params).combined(&params);
        interleaved[i].integrate(force, dt, params.max_speed);
    }
    assert!(interleaved
        .iter()
        .zip(&flock)
        .any(|(a, b)| a.velocity != b.velocity));
}

#[test]
fn parallel_and_grid_passes_match_the_reference_scan() {
    let (flock, params) = crowded_flock(150, 6);
    let reference = compute_steering(&flock, &params);

    let parallel = compute_steering(&flock, &SimulationParams { enable_parallel: true, ..params.clone() });
    assert_eq!(parallel, reference);

    for (parallel_flag, factor) in [(false, 1.0), (true, 0.5), (false, 2.5)] {
        let mut sim = FlockSimulator::new(SimulationParams {
            enable_spatial_grid: true,
            enable_parallel: parallel_flag,
            cell_size_factor: factor,
            ..params.clone()
        }).expect("valid parameters");
        let combined: Vec<Vec3> = sim
            .compute_forces(&flock)
            .iter()
            .map(|f| f.combined(&params))
            .collect();
        assert_eq!(combined, reference);
    }
}

#[test]
fn long_runs_stay_finite() {
    let (mut flock, params) = crowded_flock(60, 7);
    // Stack a few boids exactly on top of each other
    flock[1].position = flock[0].position;
    flock[2].position = flock[0].position;

    let policies = [
        BoundaryPolicy::Wrap { bounds: Vec3::splat(20.0) },
        BoundaryPolicy::InwardForce { radius: 12.0, softness: 2.0, strength: 0.5 },
    ];

    for boundary in policies {
        let mut sim = FlockSimulator::new(SimulationParams { boundary, ..params.clone() }).expect("valid parameters");
        let mut boids = flock.clone();

        for _ in 0..300 {
            sim.step(&mut boids, 1.0 / 60.0);
        }

        for boid in &boids {
            assert!(boid.position.is_finite());
            assert!(boid.velocity.is_finite());
            assert!(boid.transform.is_finite());
            assert!(boid.velocity.length() <= params.max_speed + EPSILON);
        }
    }
}

#[test]
fn boid_past_the_bound_wraps_to_the_opposite_face() {
    let policy = BoundaryPolicy::Wrap { bounds: Vec3::splat(20.0) };
    let mut boid = Boid::new(0, Vec3::new(21.0, 0.0, -3.0), Vec3::ZERO);

    policy.apply(&mut boid);

    assert_eq!(boid.position, Vec3::new(-20.0, 0.0, -3.0));
}

#[test]
fn flock_gathers_under_cohesion() {
    let params = SimulationParams {
        num_boids: 40,
        perception_radius: 30.0,
        separation_weight: 0.0,
        alignment_weight: 0.0,
        spawn_radius: 10.0,
        initial_speed: 0.0,
        boundary: BoundaryPolicy::Wrap { bounds: Vec3::splat(100.0) },
        ..Default::default()
    };
    let mut flock = spawn_flock(&params, &mut StdRng::seed_from_u64(8));

    let spread = |boids: &[Boid]| {
        let centroid = boids.iter().map(|b| b.position).sum::<Vec3>() / boids.len() as f32;
        boids.iter().map(|b| b.position.distance(centroid)).sum::<f32>() / boids.len() as f32
    };

    let before = spread(&flock);
    let mut sim = FlockSimulator::new(params).expect("valid parameters");
    for _ in 0..60 {
        sim.step(&mut flock, 1.0 / 30.0);
    }

    assert!(spread(&flock) < before);
}
