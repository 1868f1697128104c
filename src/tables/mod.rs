//! Loaders for the external model tables

use std::fmt;
use std::error::Error;

mod rotation;
mod nsd;

pub use rotation::RotationCurve;
pub use nsd::NsdMoments;

/// Error returned when a table file cannot be loaded.
#[derive(Debug,Clone,PartialEq)]
pub enum LoadError {
    /// The file could not be opened or read.
    File(String),
    /// A data line could not be parsed (name, line number).
    Syntax(String, usize),
    /// The radial coordinate failed to increase (name, line number).
    Monotonicity(String, usize),
    /// The table held too few points to interpolate.
    Length(String),
    /// A row's coordinates disagree with the expected grid (name, line number).
    Grid(String, usize),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::File(name) => write!(f, "Unable to open table file \"{}\".", name),
            LoadError::Syntax(name, line) => write!(f, "Could not parse line {} of \"{}\".", line, name),
            LoadError::Monotonicity(name, line) => write!(f, "Radius fails to increase at line {} of \"{}\".", line, name),
            LoadError::Length(name) => write!(f, "Table \"{}\" holds fewer than two points.", name),
            LoadError::Grid(name, line) => write!(f, "Row at line {} of \"{}\" is off the expected grid.", line, name),
        }
    }
}

impl Error for LoadError {}
