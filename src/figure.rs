//! Figures: the units of print work.

use serde::{Deserialize, Serialize};

/// A unit of print work, defined by the length of filament it takes to
/// trace its perimeter.
///
/// Figures are created as blueprints in the library, enqueued onto a
/// printer's queue, and marked completed when a print cycle finishes.
/// A fault leaves the figure untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Unique id for the figure.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Filament length required to print the figure, in millimeters.
    pub perimeter_mm: f64,

    /// Set once the figure has been printed successfully.
    #[serde(default)]
    pub is_completed: bool,
}

impl Figure {
    /// Create a blueprint figure with a fresh id.
    pub fn new(name: &str, perimeter_mm: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_owned(),
            perimeter_mm,
            is_completed: false,
        }
    }
}
