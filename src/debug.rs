/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct: per-step statistics about the flock
 * that the driver logs and a UI could display.
 *
 * Includes metrics for:
 * - Step duration
 * - Neighbor counts from the steering pass
 * - Mean speed and polarization (how aligned the headings are)
 * - Flock centroid
 * - Parallel processing chunk size
 */

use glam::Vec3;
use std::time::Duration;

use crate::boid::Boid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugInfo {
    pub frame: u64,
    pub boid_count: usize,
    pub step_time: Duration,
    // Ordered pairs (i sees j) found by the last steering pass
    pub neighbor_pairs: usize,
    pub mean_neighbors: f32,
    pub mean_speed: f32,
    pub max_speed_seen: f32,
    // Length of the mean unit heading: 1.0 when every boid flies the same way
    pub polarization: f32,
    pub centroid: Vec3,
    pub chunk_size: Option<usize>,
}

impl DebugInfo {
    // Refresh the kinematic statistics from the post-step flock
    pub fn record_flock(&mut self, boids: &[Boid]) {
        self.boid_count = boids.len();
        if boids.is_empty() {
            self.mean_speed = 0.0;
            self.max_speed_seen = 0.0;
            self.polarization = 0.0;
            self.centroid = Vec3::ZERO;
            return;
        }

        let n = boids.len() as f32;
        let mut speed_sum = 0.0;
        let mut max_speed = 0.0f32;
        let mut heading_sum = Vec3::ZERO;
        let mut position_sum = Vec3::ZERO;

        for boid in boids {
            let speed = boid.velocity.length();
            speed_sum += speed;
            max_speed = max_speed.max(speed);
            heading_sum += boid.heading();
            position_sum += boid.position;
        }

        self.mean_speed = speed_sum / n;
        self.max_speed_seen = max_speed;
        self.polarization = (heading_sum / n).length();
        self.centroid = position_sum / n;
    }

    pub fn record_neighbors(&mut self, neighbor_pairs: usize, boid_count: usize) {
        self.neighbor_pairs = neighbor_pairs;
        self.mean_neighbors = if boid_count == 0 {
            0.0
        } else {
            neighbor_pairs as f32 / boid_count as f32
        };
    }
}
