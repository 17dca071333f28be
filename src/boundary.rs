/*
 * Boundary Module
 *
 * Containment policies that keep the flock inside a region of the world.
 * Exactly one policy is active at a time:
 * - Wrap: a toroidal world, boids leaving one face re-enter at the opposite face
 * - InwardForce: a smooth pull back toward the origin that grows with distance
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::boid::Boid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum BoundaryPolicy {
    // Half extents of the box, per axis
    Wrap { bounds: Vec3 },
    // Arctangent falloff centered on `radius`; `softness` sets how wide the transition is
    InwardForce { radius: f32, softness: f32, strength: f32 },
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        BoundaryPolicy::Wrap { bounds: Vec3::splat(20.0) }
    }
}

impl BoundaryPolicy {
    // Force pulling a boid at `position` back toward the origin.
    // Always zero for the wrap policy.
    pub fn containment_force(&self, position: Vec3) -> Vec3 {
        match *self {
            BoundaryPolicy::Wrap { .. } => Vec3::ZERO,
            BoundaryPolicy::InwardForce { radius, softness, strength } => {
                let distance = position.length();
                if distance <= 0.0 || softness <= 0.0 {
                    return Vec3::ZERO;
                }

                // 0 well inside the radius, 0.5 on it, approaching 1 far outside
                let falloff = ((distance - radius) / softness).atan() / PI + 0.5;
                -position / distance * (strength * falloff)
            }
        }
    }

    // Apply the positional part of the policy (the wrap teleport)
    pub fn apply(&self, boid: &mut Boid) {
        if let BoundaryPolicy::Wrap { bounds } = *self {
            boid.position = wrap_position(boid.position, bounds);
        }
    }
}

// Per-axis wrap: anything beyond +bound jumps to -bound and vice versa
pub fn wrap_position(position: Vec3, bounds: Vec3) -> Vec3 {
    Vec3::new(
        wrap_axis(position.x, bounds.x),
        wrap_axis(position.y, bounds.y),
        wrap_axis(position.z, bounds.z),
    )
}

#[inline]
fn wrap_axis(value: f32, bound: f32) -> f32 {
    if value > bound {
        -bound
    } else if value < -bound {
        bound
    } else {
        value
    }
}
