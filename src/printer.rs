//! The printer aggregate and its guarded state machine.

use serde::{Deserialize, Serialize};

use crate::{
    coil::{Coil, Consumption},
    error::Error,
    fault::Fault,
    queue::JobQueue,
};

/// Lifecycle state of a printer.
///
/// `Completed` and `Faulted` end one print cycle; they resolve back to
/// `Idle` once the caller acknowledges the outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, parse_display::Display)]
pub enum PrinterState {
    /// Not printing. Resources may be attached and detached.
    #[default]
    Idle,

    /// A print cycle is running; the head of the queue is the active job.
    Printing,

    /// The active job finished and was removed from the queue.
    Completed,

    /// A fault interrupted the print cycle.
    Faulted,
}

/// What a single simulation tick did to a printer.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The print advanced; carries overall progress in percent.
    Progressed(f64),

    /// The active job finished; carries the completed figure's id.
    Completed(String),

    /// A fault struck mid-tick.
    Faulted(Fault),
}

/// A 3D printer: at most one installed coil, an ordered print queue, and
/// the state machine governing whether it may print.
///
/// All transitions are synchronous and guarded; a failed guard returns an
/// error and mutates nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Printer {
    /// Unique id for the printer.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Manufacturer brand.
    pub brand: String,

    /// Print speed, in millimeters of filament per second.
    pub speed_mm_per_sec: f64,

    /// The installed coil, if any.
    #[serde(default)]
    pub coil: Option<Coil>,

    /// Figures waiting to be printed.
    #[serde(default)]
    pub queue: JobQueue,

    #[serde(default)]
    state: PrinterState,

    #[serde(default)]
    progress: f64,

    #[serde(default)]
    last_fault: Option<Fault>,
}

impl Printer {
    /// Create an idle printer with a fresh id, no coil, and an empty queue.
    pub fn new(name: &str, brand: &str, speed_mm_per_sec: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_owned(),
            brand: brand.to_owned(),
            speed_mm_per_sec,
            coil: None,
            queue: JobQueue::new(),
            state: PrinterState::Idle,
            progress: 0.0,
            last_fault: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PrinterState {
        self.state
    }

    /// Progress of the current print cycle, in percent. Meaningful only
    /// while printing or after a recoverable fault preserved it.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The fault that ended the current print cycle, if one did.
    pub fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    /// Begin a print cycle on the head of the queue.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state == PrinterState::Printing {
            return Err(Error::resource("Printer is already printing"));
        }
        if self.coil.is_none() {
            return Err(Error::resource("No coil inside printer, first refill it"));
        }
        if self.queue.is_empty() {
            return Err(Error::resource("No figures in queue"));
        }

        self.state = PrinterState::Printing;
        self.progress = 0.0;
        self.last_fault = None;
        Ok(())
    }

    /// Install a coil.
    pub fn refill(&mut self, coil: Coil) -> Result<(), Error> {
        if self.state == PrinterState::Printing {
            return Err(Error::resource("Cannot remove coil while printing"));
        }
        if self.coil.is_some() {
            return Err(Error::resource("Coil is already installed"));
        }

        self.coil = Some(coil);
        Ok(())
    }

    /// Detach and return the installed coil.
    pub fn remove_coil(&mut self) -> Result<Coil, Error> {
        if self.state == PrinterState::Printing {
            return Err(Error::resource("Cannot remove coil while printing"));
        }

        self.coil
            .take()
            .ok_or_else(|| Error::resource("No coil inside printer, first refill it"))
    }

    /// Resume a print cycle interrupted by a recoverable fault, keeping
    /// the preserved progress.
    pub fn resume(&mut self) -> Result<(), Error> {
        let recoverable = self.state == PrinterState::Faulted
            && self.last_fault.as_ref().is_some_and(Fault::is_recoverable);
        if !recoverable {
            return Err(Error::resource("Printer has no fault to recover from"));
        }

        self.state = PrinterState::Printing;
        self.last_fault = None;
        Ok(())
    }

    /// Acknowledge a completed or faulted print cycle, returning to idle.
    pub fn acknowledge(&mut self) -> Result<(), Error> {
        match self.state {
            PrinterState::Completed | PrinterState::Faulted => {
                self.state = PrinterState::Idle;
                self.progress = 0.0;
                self.last_fault = None;
                Ok(())
            }
            PrinterState::Idle | PrinterState::Printing => {
                Err(Error::resource("Printer has no outcome to acknowledge"))
            }
        }
    }

    /// Abandon the current print cycle and return to idle. Filament
    /// already consumed and the queue stay exactly as they are.
    pub fn cancel(&mut self) {
        self.state = PrinterState::Idle;
        self.progress = 0.0;
        self.last_fault = None;
    }

    /// Apply one simulation tick: the sampled fault if one struck,
    /// otherwise `speed × tick_seconds` millimeters of consumption and the
    /// matching progress advance toward the active job's perimeter.
    pub(crate) fn step(&mut self, tick_seconds: f64, fault: Option<Fault>) -> Result<TickOutcome, Error> {
        if self.state != PrinterState::Printing {
            return Err(Error::resource("Printer is not printing"));
        }

        if let Some(fault) = fault {
            return Ok(TickOutcome::Faulted(self.apply_fault(fault)));
        }

        let perimeter_mm = self
            .queue
            .head()
            .map(|figure| figure.perimeter_mm)
            .ok_or_else(|| Error::resource("No figures in queue"))?;
        let coil = self
            .coil
            .as_mut()
            .ok_or_else(|| Error::resource("No coil inside printer, first refill it"))?;

        let consumption = coil.consume(self.speed_mm_per_sec * tick_seconds);
        let advance = consumption.drawn_mm() / perimeter_mm * 100.0;
        self.progress = (self.progress + advance).min(100.0);

        if self.progress >= 100.0 {
            // head() just matched, so the queue cannot be empty here
            let mut job = self
                .queue
                .dequeue_head()
                .ok_or_else(|| Error::resource("No figures in queue"))?;
            job.is_completed = true;
            self.state = PrinterState::Completed;
            return Ok(TickOutcome::Completed(job.id));
        }

        if let Consumption::Exhausted(_) = consumption {
            return Ok(TickOutcome::Faulted(self.apply_fault(Fault::OutOfFilament)));
        }

        Ok(TickOutcome::Progressed(self.progress))
    }

    fn apply_fault(&mut self, fault: Fault) -> Fault {
        if fault == Fault::NozzleClogged {
            // the active job is ruined, not completed
            self.queue.dequeue_head();
        }
        self.state = PrinterState::Faulted;
        self.last_fault = Some(fault);
        fault
    }
}
