#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate tracks a small fleet of 3D printers, the filament coils
//! loaded into them, and a library of figures waiting to be printed.
//!
//! The heart of the crate is the print simulation engine: a guarded state
//! machine per printer that decides whether a print may start, consumes
//! filament tick by tick, raises randomized faults mid-print, and controls
//! when coils may be attached, detached, or cut.

mod coil;
mod config;
mod engine;
mod error;
mod farm;
mod fault;
mod figure;
mod printer;
mod queue;

pub use coil::{Coil, Consumption};
pub use config::{Config, SimulationSettings};
pub use engine::{Engine, PrintEvent, SimulationConfig};
pub use error::Error;
pub use farm::Farm;
pub use fault::{Fault, FaultInjector};
pub use figure::Figure;
pub use printer::{Printer, PrinterState, TickOutcome};
pub use queue::JobQueue;
