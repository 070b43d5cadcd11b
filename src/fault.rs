//! Faults that interrupt an in-progress print, and the randomized
//! injector that raises them.

use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

/// A named interruption of an in-progress print.
///
/// Recoverable faults carry the progress at the moment they struck so a
/// retry resumes rather than restarting. Terminal faults end the print
/// cycle for good; a nozzle clog additionally ruins the active job.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum Fault {
    /// Terminal. The active job is ruined and dropped from the queue.
    #[error("Nozzle is clogged, figure ruined")]
    NozzleClogged,

    /// Recoverable. Power was lost mid-print.
    #[error("Electricity is down, try again")]
    ElectricityDown {
        /// Progress, in percent, at the moment the fault struck.
        progress: f64,
    },

    /// Recoverable. The filament thread snapped.
    #[error("Thread breakage, try again")]
    ThreadBreakage {
        /// Progress, in percent, at the moment the fault struck.
        progress: f64,
    },

    /// Terminal. The coil ran out of filament before the job finished.
    #[error("Out of filament")]
    OutOfFilament,
}

impl Fault {
    /// True for faults a retry can recover from with progress preserved.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ElectricityDown { .. } | Self::ThreadBreakage { .. })
    }

    /// Progress preserved by a recoverable fault.
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::ElectricityDown { progress } | Self::ThreadBreakage { progress } => Some(*progress),
            Self::NozzleClogged | Self::OutOfFilament => None,
        }
    }
}

/// Stateless per-tick fault sampler.
///
/// Each tick draws one uniform value in `[0, 1000)` and matches it against
/// the per-mille bands in a fixed order, so the bands are mutually
/// exclusive: below `clog` a nozzle clog, below `outage` a power outage,
/// below `breakage` a thread breakage, anything else no fault. The default
/// bands reproduce the farm's observed failure rates of 0.1%, 0.3%, and
/// 0.5% per tick; they are policy constants, not derived from printer
/// attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaultInjector {
    clog_below: f64,
    outage_below: f64,
    breakage_below: f64,
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self {
            clog_below: 1.0,
            outage_below: 4.0,
            breakage_below: 9.0,
        }
    }
}

impl FaultInjector {
    /// An injector with custom per-mille bands. `clog_below` must be at
    /// most `outage_below`, which must be at most `breakage_below`; bands
    /// of equal bounds have zero width.
    pub fn with_bands(clog_below: f64, outage_below: f64, breakage_below: f64) -> Self {
        Self {
            clog_below,
            outage_below,
            breakage_below,
        }
    }

    /// An injector that never faults, for deterministic runs.
    pub fn disabled() -> Self {
        Self::with_bands(0.0, 0.0, 0.0)
    }

    /// Sample one tick. `progress` is the printer's progress going into
    /// the tick; it is embedded into recoverable faults.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, progress: f64) -> Option<Fault> {
        let r = rng.random_range(0.0..1000.0);

        if r < self.clog_below {
            return Some(Fault::NozzleClogged);
        }
        if r < self.outage_below {
            return Some(Fault::ElectricityDown { progress });
        }
        if r < self.breakage_below {
            return Some(Fault::ThreadBreakage { progress });
        }

        None
    }
}
