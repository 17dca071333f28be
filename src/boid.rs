/*
 * Boid Module
 *
 * This module defines the Boid struct: the kinematic state of one simulated
 * agent. Boids are created once when the flock is spawned and then mutated in
 * place every frame by the FlockSimulator. The steering rules themselves live in
 * the physics module; a boid only knows how to integrate the acceleration it is
 * given and how to describe its own orientation to a renderer.
 */

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::params::SimulationParams;

#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    pub id: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    // Transient per-frame accumulator, consumed by `update`
    pub acceleration: Vec3,
    // Model matrix derived from position and heading
    pub transform: Mat4,
}

impl Boid {
    pub fn new(id: usize, position: Vec3, velocity: Vec3) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec3::ZERO,
            transform: orientation_transform(position, velocity),
        }
    }

    // A boid placed uniformly inside a sphere of `spawn_radius` with a small random heading
    pub fn random<R: Rng + ?Sized>(id: usize, rng: &mut R, spawn_radius: f32, initial_speed: f32) -> Self {
        // Rejection sample the unit ball so positions are uniform, not clustered at the poles
        let unit = loop {
            let candidate = Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            );
            if candidate.length_squared() <= 1.0 {
                break candidate;
            }
        };

        let velocity = if initial_speed > 0.0 {
            Vec3::new(
                rng.gen_range(-initial_speed..=initial_speed),
                rng.gen_range(-initial_speed..=initial_speed),
                rng.gen_range(-initial_speed..=initial_speed),
            )
        } else {
            Vec3::ZERO
        };

        Self::new(id, unit * spawn_radius, velocity)
    }

    // Apply a force to the boid
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    // Semi-implicit Euler step: velocity first (clamped to max_speed), then position.
    // A non-positive or non-finite time step leaves the boid untouched.
    pub fn integrate(&mut self, acceleration: Vec3, delta_time: f32, max_speed: f32) {
        if !(delta_time > 0.0 && delta_time.is_finite()) {
            return;
        }

        self.velocity = limit(self.velocity + acceleration * delta_time, max_speed);
        self.position += self.velocity * delta_time;
        self.acceleration = Vec3::ZERO;
    }

    // Integrate whatever has been accumulated through `apply_force`
    pub fn update(&mut self, delta_time: f32, max_speed: f32) {
        let acceleration = self.acceleration;
        self.integrate(acceleration, delta_time, max_speed);
    }

    pub fn refresh_transform(&mut self) {
        self.transform = orientation_transform(self.position, self.velocity);
    }

    // Unit heading, or zero when the boid is at rest
    pub fn heading(&self) -> Vec3 {
        self.velocity.normalize_or_zero()
    }
}

// Spawn `params.num_boids` boids with ids 0..n
pub fn spawn_flock<R: Rng + ?Sized>(params: &SimulationParams, rng: &mut R) -> Vec<Boid> {
    (0..params.num_boids)
        .map(|id| Boid::random(id, rng, params.spawn_radius, params.initial_speed))
        .collect()
}

// Clamp the magnitude of `vector` to at most `max`
#[inline]
pub fn limit(vector: Vec3, max: f32) -> Vec3 {
    if max <= 0.0 {
        return Vec3::ZERO;
    }
    vector.clamp_length_max(max)
}

// Rescale `vector` to `magnitude`. A zero-length vector has no direction, so it
// stays zero instead of becoming NaN.
#[inline]
pub fn set_magnitude(vector: Vec3, magnitude: f32) -> Vec3 {
    vector.normalize_or_zero() * magnitude
}

// Look-direction model matrix: local +Z follows the velocity, world +Y is up.
// Headings parallel to +Y fall back to +X as the up reference.
pub fn orientation_transform(position: Vec3, velocity: Vec3) -> Mat4 {
    let forward = velocity.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Mat4::from_translation(position);
    }

    let reference_up = if forward.cross(Vec3::Y).length_squared() < 1.0e-6 {
        Vec3::X
    } else {
        Vec3::Y
    };
    let right = reference_up.cross(forward).normalize();
    let up = forward.cross(right);

    Mat4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        position.extend(1.0),
    )
}
