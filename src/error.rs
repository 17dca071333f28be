/*
 * Error Module
 *
 * Errors for loading and validating simulation parameters. The flocking
 * update itself is total over finite inputs and never returns an error.
 */

use std::fmt;
use std::io;

// A parameter value that cannot drive the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsError {
    // Value must be finite and strictly positive
    NotPositive { name: &'static str, value: f32 },
    // Value must be finite and zero or greater
    Negative { name: &'static str, value: f32 },
    // Value lies outside the range the control surface allows
    OutOfRange { name: &'static str, value: f32, min: f32, max: f32 },
    // Flock size outside the allowed range
    BoidCount { value: usize, min: usize, max: usize },
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::NotPositive { name, value } => {
                write!(f, "{} must be a finite positive number, got {}", name, value)
            }
            ParamsError::Negative { name, value } => {
                write!(f, "{} must be finite and not negative, got {}", name, value)
            }
            ParamsError::OutOfRange { name, value, min, max } => {
                write!(f, "{} = {} is outside the allowed range {}..={}", name, value, min, max)
            }
            ParamsError::BoidCount { value, min, max } => {
                write!(f, "num_boids = {} is outside the allowed range {}..={}", value, min, max)
            }
        }
    }
}

impl std::error::Error for ParamsError {}

// Errors that can occur while reading or writing a parameter file
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    Invalid(ParamsError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access parameter file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse parameter file: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid parameters: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ParamsError> for ConfigError {
    fn from(e: ParamsError) -> Self {
        ConfigError::Invalid(e)
    }
}
