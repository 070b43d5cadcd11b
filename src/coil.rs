//! Filament coils and their consumption operations.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A filament spool with a finite consumable length.
///
/// A coil is owned by at most one [crate::Printer] at a time. Its length
/// only ever shrinks, through [Coil::cut] or through consumption while a
/// print is running, and it never goes negative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coil {
    /// Unique id for the coil.
    pub id: String,

    /// Filament material, e.g. "PLA".
    pub material: String,

    /// Filament color.
    pub color: String,

    /// Remaining filament length, in millimeters.
    pub length_mm: f64,
}

/// Result of drawing filament off a coil during a simulation tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Consumption {
    /// The full requested amount was drawn.
    Drawn(f64),

    /// The spool could supply at most the carried amount; its remaining
    /// length is now zero.
    Exhausted(f64),
}

impl Consumption {
    /// Millimeters actually drawn off the spool.
    pub fn drawn_mm(&self) -> f64 {
        match self {
            Self::Drawn(mm) | Self::Exhausted(mm) => *mm,
        }
    }
}

impl Coil {
    /// Create a full coil with a fresh id.
    pub fn new(material: &str, color: &str, length_mm: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            material: material.to_owned(),
            color: color.to_owned(),
            length_mm,
        }
    }

    /// Cut `cut_length` millimeters off the coil, returning the shortened
    /// coil. Pure: `self` is left untouched on both success and failure.
    pub fn cut(&self, cut_length: f64) -> Result<Coil, Error> {
        if cut_length <= 0.0 {
            return Err(Error::invalid_input("Cut length must be bigger than 0"));
        }
        if cut_length > self.length_mm {
            return Err(Error::invalid_input("Cut length is bigger than coil length"));
        }

        let mut coil = self.clone();
        coil.length_mm -= cut_length;
        Ok(coil)
    }

    /// Draw up to `amount_mm` of filament off the spool, clamping the
    /// remaining length at zero instead of underflowing. The caller learns
    /// how much was actually drawn and whether the spool is now empty.
    pub(crate) fn consume(&mut self, amount_mm: f64) -> Consumption {
        if amount_mm < self.length_mm {
            self.length_mm -= amount_mm;
            Consumption::Drawn(amount_mm)
        } else {
            let drawn = self.length_mm;
            self.length_mm = 0.0;
            Consumption::Exhausted(drawn)
        }
    }
}
