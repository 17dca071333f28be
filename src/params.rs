/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that holds every tuning value
 * the flocking update reads. One instance is passed explicitly into each step;
 * nothing is stored in globals. Parameters can be loaded from and saved to JSON,
 * and the ranges the interactive controls expose double as validation bounds.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::boundary::BoundaryPolicy;
use crate::error::{ConfigError, ParamsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_boids: usize,
    pub perception_radius: f32,
    pub max_force: f32,
    pub max_speed: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub boundary: BoundaryPolicy,
    // Spawn volume and initial velocity jitter
    pub spawn_radius: f32,
    pub initial_speed: f32,
    // Performance settings
    pub enable_parallel: bool,
    pub enable_spatial_grid: bool,
    pub cell_size_factor: f32, // Multiplier for cell size relative to perception radius
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 50,
            perception_radius: 5.0,
            max_force: 0.1,
            max_speed: 4.0,
            separation_weight: 1.0,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            boundary: BoundaryPolicy::default(),
            spawn_radius: 10.0,
            initial_speed: 0.01,
            enable_parallel: false,
            enable_spatial_grid: false,
            cell_size_factor: 1.0,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let counts = Self::get_num_boids_range();
        if !counts.contains(&self.num_boids) {
            return Err(ParamsError::BoidCount {
                value: self.num_boids,
                min: *counts.start(),
                max: *counts.end(),
            });
        }

        positive("perception_radius", self.perception_radius)?;
        in_range("perception_radius", self.perception_radius, &Self::get_radius_range())?;
        positive("max_speed", self.max_speed)?;
        in_range("max_speed", self.max_speed, &Self::get_max_speed_range())?;
        non_negative("max_force", self.max_force)?;
        non_negative("spawn_radius", self.spawn_radius)?;
        non_negative("initial_speed", self.initial_speed)?;

        let weights = Self::get_weight_range();
        in_range("separation_weight", self.separation_weight, &weights)?;
        in_range("alignment_weight", self.alignment_weight, &weights)?;
        in_range("cohesion_weight", self.cohesion_weight, &weights)?;
        in_range("cell_size_factor", self.cell_size_factor, &Self::get_cell_size_factor_range())?;

        match self.boundary {
            BoundaryPolicy::Wrap { bounds } => {
                positive("bounds.x", bounds.x)?;
                positive("bounds.y", bounds.y)?;
                positive("bounds.z", bounds.z)?;
            }
            BoundaryPolicy::InwardForce { radius, softness, strength } => {
                non_negative("radius", radius)?;
                positive("softness", softness)?;
                non_negative("strength", strength)?;
            }
        }

        Ok(())
    }

    // Load and validate parameters from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    // Get parameter ranges for interactive controls
    pub fn get_num_boids_range() -> RangeInclusive<usize> {
        1..=100000
    }

    pub fn get_max_speed_range() -> RangeInclusive<f32> {
        0.1..=100.0
    }

    pub fn get_weight_range() -> RangeInclusive<f32> {
        0.0..=3.0
    }

    pub fn get_radius_range() -> RangeInclusive<f32> {
        0.5..=100.0
    }

    pub fn get_cell_size_factor_range() -> RangeInclusive<f32> {
        0.05..=10.0
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ParamsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParamsError::Negative { name, value })
    }
}

fn in_range(name: &'static str, value: f32, range: &RangeInclusive<f32>) -> Result<(), ParamsError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParamsError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
