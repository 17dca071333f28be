/*
 * Physics Module
 *
 * This module handles the flocking update. Every step runs in two phases:
 * 1. Steering: every boid's forces are computed from one immutable snapshot of
 *    the flock and written into a separate buffer
 * 2. Integration: the buffered accelerations are applied to every boid, then the
 *    boundary policy runs and the render transforms are refreshed
 *
 * Keeping the phases apart makes the result independent of iteration order, and
 * it is what allows the steering phase to be split across rayon workers: each
 * worker reads the shared snapshot and writes only its own output slots.
 *
 * The three rules (separation, alignment, cohesion) are plain functions over the
 * accumulated neighbor sums so each can be tested on its own.
 */

use glam::{Mat4, Vec3};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::boid::{limit, set_magnitude, Boid};
use crate::debug::DebugInfo;
use crate::error::ParamsError;
use crate::params::SimulationParams;
use crate::spatial_grid::SpatialGrid;

// Running totals over the neighbors of one boid
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeighborSums {
    pub pushback: Vec3,
    pub velocity: Vec3,
    pub position: Vec3,
    pub count: usize,
}

impl NeighborSums {
    // Scan `candidates` for neighbors of `boids[index]`: any other boid at a
    // distance d with 0 < d < radius. A boid is never its own neighbor.
    pub fn gather<I>(boids: &[Boid], index: usize, radius: f32, candidates: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let boid = &boids[index];
        let mut sums = NeighborSums::default();

        for j in candidates {
            if j == index {
                continue;
            }

            let other = &boids[j];
            let offset = boid.position - other.position;
            let d = offset.length();

            if d > 0.0 && d < radius {
                // Unit vector pointing away from the neighbor
                sums.pushback += offset / d;
                sums.velocity += other.velocity;
                sums.position += other.position;
                sums.count += 1;
            }
        }

        sums
    }
}

// Reynolds steering: desired velocity of length max_speed minus current velocity,
// clamped to max_force. No desired direction means no force.
#[inline]
fn steer(desired_direction: Vec3, velocity: Vec3, params: &SimulationParams) -> Vec3 {
    let desired = set_magnitude(desired_direction, params.max_speed);
    if desired == Vec3::ZERO {
        return Vec3::ZERO;
    }
    limit(desired - velocity, params.max_force)
}

// Steer away from crowding neighbors
pub fn separation(boid: &Boid, sums: &NeighborSums, params: &SimulationParams) -> Vec3 {
    if sums.count == 0 {
        return Vec3::ZERO;
    }
    steer(sums.pushback / sums.count as f32, boid.velocity, params)
}

// Steer towards the average velocity of neighbors
pub fn alignment(boid: &Boid, sums: &NeighborSums, params: &SimulationParams) -> Vec3 {
    if sums.count == 0 {
        return Vec3::ZERO;
    }
    steer(sums.velocity / sums.count as f32, boid.velocity, params)
}

// Steer towards the centroid of neighbors
pub fn cohesion(boid: &Boid, sums: &NeighborSums, params: &SimulationParams) -> Vec3 {
    if sums.count == 0 {
        return Vec3::ZERO;
    }
    let centroid = sums.position / sums.count as f32;
    steer(centroid - boid.position, boid.velocity, params)
}

// The three unweighted rule outputs for one boid
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub neighbors: usize,
}

impl SteeringForces {
    pub fn from_sums(boid: &Boid, sums: &NeighborSums, params: &SimulationParams) -> Self {
        Self {
            separation: separation(boid, sums, params),
            alignment: alignment(boid, sums, params),
            cohesion: cohesion(boid, sums, params),
            neighbors: sums.count,
        }
    }

    // Weighted sum of the three rules
    pub fn combined(&self, params: &SimulationParams) -> Vec3 {
        self.separation * params.separation_weight
            + self.alignment * params.alignment_weight
            + self.cohesion * params.cohesion_weight
    }
}

// Rule outputs for `boids[index]` using the all-pairs neighbor scan
pub fn steering_components(boids: &[Boid], index: usize, params: &SimulationParams) -> SteeringForces {
    steering_for(boids, index, params, None, &mut Vec::new())
}

// One combined acceleration per boid, in input order. Pure over the snapshot.
pub fn compute_steering(boids: &[Boid], params: &SimulationParams) -> Vec<Vec3> {
    let mut forces = Vec::with_capacity(boids.len());
    steering_pass(boids, params, None, &mut forces);
    forces.iter().map(|f| f.combined(params)).collect()
}

// Renderer-facing model matrices, one per boid
pub fn instance_transforms(boids: &[Boid]) -> Vec<Mat4> {
    boids.iter().map(|boid| boid.transform).collect()
}

fn steering_for(
    boids: &[Boid],
    index: usize,
    params: &SimulationParams,
    grid: Option<&SpatialGrid>,
    scratch: &mut Vec<usize>,
) -> SteeringForces {
    let radius = params.perception_radius;
    let sums = match grid {
        Some(grid) => {
            grid.get_nearby_indices(boids[index].position, radius, scratch);
            NeighborSums::gather(boids, index, radius, scratch.iter().copied())
        }
        None => NeighborSums::gather(boids, index, radius, 0..boids.len()),
    };
    SteeringForces::from_sums(&boids[index], &sums, params)
}

// Fill `out` with the rule outputs for every boid. Returns the parallel chunk
// size when the pass ran on the rayon pool.
fn steering_pass(
    boids: &[Boid],
    params: &SimulationParams,
    grid: Option<&SpatialGrid>,
    out: &mut Vec<SteeringForces>,
) -> Option<usize> {
    if params.enable_parallel {
        // Big enough chunks that each worker gets a contiguous run of boids
        let chunk_size = std::cmp::max(boids.len() / rayon::current_num_threads(), 1);

        (0..boids.len())
            .into_par_iter()
            .with_min_len(chunk_size)
            .map_init(Vec::new, |scratch, i| steering_for(boids, i, params, grid, scratch))
            .collect_into_vec(out);

        Some(chunk_size)
    } else {
        let mut scratch = Vec::new();
        out.clear();
        out.extend((0..boids.len()).map(|i| steering_for(boids, i, params, grid, &mut scratch)));
        None
    }
}

// Owns the tuning parameters and scratch buffers; the boids themselves belong
// to the caller and are only borrowed for one step.
pub struct FlockSimulator {
    pub params: SimulationParams,
    pub debug_info: DebugInfo,
    spatial_grid: SpatialGrid,
    forces: Vec<SteeringForces>,
}

impl FlockSimulator {
    // Fails when the parameters would give a degenerate grid or clamp
    pub fn new(params: SimulationParams) -> Result<Self, ParamsError> {
        params.validate()?;
        info!(
            boids = params.num_boids,
            perception_radius = params.perception_radius,
            max_speed = params.max_speed,
            max_force = params.max_force,
            parallel = params.enable_parallel,
            spatial_grid = params.enable_spatial_grid,
            "Creating flock simulator"
        );

        let cell_size = params.perception_radius * params.cell_size_factor;
        Ok(Self {
            spatial_grid: SpatialGrid::new(cell_size),
            forces: Vec::with_capacity(params.num_boids),
            debug_info: DebugInfo::default(),
            params,
        })
    }

    // Swap in new tuning values between steps
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ParamsError> {
        params.validate()?;
        if params.boundary != self.params.boundary {
            info!(boundary = ?params.boundary, "Boundary policy changed");
        }
        self.params = params;
        Ok(())
    }

    // Steering phase only: rule outputs for every boid, read from one snapshot
    pub fn compute_forces(&mut self, boids: &[Boid]) -> &[SteeringForces] {
        let grid = if self.params.enable_spatial_grid {
            self.spatial_grid
                .set_cell_size(self.params.perception_radius * self.params.cell_size_factor);
            self.spatial_grid.rebuild(boids.iter().map(|boid| boid.position));
            Some(&self.spatial_grid)
        } else {
            None
        };

        self.debug_info.chunk_size = steering_pass(boids, &self.params, grid, &mut self.forces);
        &self.forces
    }

    // Advance the flock by one frame
    pub fn step(&mut self, boids: &mut [Boid], delta_time: f32) {
        if !delta_time.is_finite() {
            warn!(delta_time, "Ignoring non-finite frame delta");
            return;
        }
        if delta_time <= 0.0 {
            debug!(delta_time, "Skipping step with non-positive frame delta");
            return;
        }

        let start = Instant::now();
        self.compute_forces(boids);

        let params = &self.params;
        let mut neighbor_pairs = 0;
        for (boid, forces) in boids.iter_mut().zip(&self.forces) {
            neighbor_pairs += forces.neighbors;

            // Overwrite, never carry acceleration over from a previous frame
            boid.acceleration = forces.combined(params);
            boid.apply_force(params.boundary.containment_force(boid.position));
            boid.update(delta_time, params.max_speed);

            params.boundary.apply(boid);
            boid.refresh_transform();
        }

        self.debug_info.frame += 1;
        self.debug_info.step_time = start.elapsed();
        self.debug_info.record_neighbors(neighbor_pairs, boids.len());
        self.debug_info.record_flock(boids);

        debug!(
            frame = self.debug_info.frame,
            mean_neighbors = self.debug_info.mean_neighbors,
            mean_speed = self.debug_info.mean_speed,
            polarization = self.debug_info.polarization,
            step_us = self.debug_info.step_time.as_micros() as u64,
            "Flock step"
        );
    }
}
