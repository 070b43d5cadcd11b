//! The print simulation engine: drives the printers' state machines over
//! time.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time,
};

use crate::{
    coil::Coil,
    error::Error,
    farm::Farm,
    fault::FaultInjector,
    printer::{PrinterState, TickOutcome},
};

/// Runtime policy for the simulation loops.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Wall-clock pause between ticks of a spawned print loop. Also the
    /// simulated duration of one tick, so filament consumption tracks
    /// real time.
    pub tick_interval: Duration,

    /// Resume automatically after a recoverable fault instead of waiting
    /// for an explicit `resume` call.
    pub auto_resume: bool,

    /// Fault sampling policy.
    pub injector: FaultInjector,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            auto_resume: false,
            injector: FaultInjector::default(),
        }
    }
}

/// Notification emitted after every applied tick.
#[derive(Clone, Debug)]
pub struct PrintEvent {
    /// The printer the tick was applied to.
    pub printer_id: String,

    /// What the tick did.
    pub outcome: TickOutcome,
}

struct PrintTask {
    handle: JoinHandle<Result<(), Error>>,
    stop: watch::Sender<bool>,
}

/// Drives the printer state machines: start, per-tick progress and fault
/// evaluation, completion, and resource-guarded refill and removal.
///
/// One engine serves the whole farm. Every operation locks the single
/// printer it touches for its whole duration, so a refill or removal
/// either fully precedes or fully follows a tick; printers never share
/// mutable state with each other.
pub struct Engine {
    farm: Arc<Farm>,
    config: SimulationConfig,
    active: Mutex<HashMap<String, PrintTask>>,
    events: broadcast::Sender<PrintEvent>,
}

impl Engine {
    /// Create an engine over the given farm.
    pub fn new(farm: Arc<Farm>, config: SimulationConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            farm,
            config,
            active: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// The farm this engine drives.
    pub fn farm(&self) -> &Arc<Farm> {
        &self.farm
    }

    /// Subscribe to per-tick notifications. Fan-out to any presentation
    /// layer happens through this channel; the engine itself is pure
    /// state transition.
    pub fn subscribe(&self) -> broadcast::Receiver<PrintEvent> {
        self.events.subscribe()
    }

    /// Begin a print cycle on the head of the printer's queue.
    pub async fn start(&self, printer_id: &str) -> Result<(), Error> {
        let printer = self.farm.printer(printer_id)?;
        let mut printer = printer.lock().await;
        printer.start()?;
        tracing::info!(
            printer_id,
            job = ?printer.queue.head().map(|figure| figure.name.as_str()),
            "print started"
        );
        Ok(())
    }

    /// Apply one simulation tick to a printer: sample a fault, consume
    /// filament, advance progress, and fan the outcome out to
    /// subscribers.
    pub async fn tick(&self, printer_id: &str) -> Result<TickOutcome, Error> {
        let printer = self.farm.printer(printer_id)?;
        let outcome = {
            let mut printer = printer.lock().await;
            let fault = {
                let mut rng = rand::rng();
                self.config.injector.sample(&mut rng, printer.progress())
            };
            printer.step(self.config.tick_interval.as_secs_f64(), fault)?
        };

        match &outcome {
            TickOutcome::Progressed(progress) => {
                tracing::debug!(printer_id, progress = *progress, "tick");
            }
            TickOutcome::Completed(job_id) => {
                // queue entries are copies; ad-hoc jobs may have no
                // library record to mark
                if let Err(err) = self.farm.mark_completed(job_id) {
                    tracing::debug!(%job_id, error = %err, "completed job has no library record");
                }
                tracing::info!(printer_id, %job_id, "print completed");
            }
            TickOutcome::Faulted(fault) => {
                tracing::warn!(printer_id, fault = %fault, "print faulted");
            }
        }

        let _ = self.events.send(PrintEvent {
            printer_id: printer_id.to_owned(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Start a print cycle and drive it on a timer until it completes,
    /// faults terminally, or is stopped. At most one loop runs per
    /// printer.
    pub async fn spawn(self: &Arc<Self>, printer_id: &str) -> Result<(), Error> {
        self.start(printer_id).await?;
        self.spawn_loop(printer_id).await
    }

    /// Stop a printer at the next tick boundary, returning it to idle.
    /// Filament already consumed and the queue are kept as they are.
    pub async fn stop(&self, printer_id: &str) -> Result<(), Error> {
        let task = self.active.lock().await.remove(printer_id);
        match task {
            Some(task) => {
                let _ = task.stop.send(true);
                task.handle
                    .await
                    .map_err(|_| Error::resource("Print loop failed"))?
            }
            None => {
                // not loop-driven; cancel a manually ticked print
                let printer = self.farm.printer(printer_id)?;
                let mut printer = printer.lock().await;
                if printer.state() != PrinterState::Printing {
                    return Err(Error::resource("Printer is not printing"));
                }
                printer.cancel();
                Ok(())
            }
        }
    }

    /// Resume a print cycle interrupted by a recoverable fault. If a
    /// spawned loop was driving the printer, a new loop picks up where
    /// the faulted one stopped.
    pub async fn resume(self: &Arc<Self>, printer_id: &str) -> Result<(), Error> {
        self.farm.printer(printer_id)?.lock().await.resume()?;
        tracing::info!(printer_id, "print resumed");
        if self.active.lock().await.contains_key(printer_id) {
            self.spawn_loop(printer_id).await?;
        }
        Ok(())
    }

    /// Acknowledge a completed or faulted print cycle, returning the
    /// printer to idle.
    pub async fn acknowledge(&self, printer_id: &str) -> Result<(), Error> {
        self.farm.printer(printer_id)?.lock().await.acknowledge()?;
        self.active.lock().await.remove(printer_id);
        Ok(())
    }

    /// Cut a length off a shelf coil, returning the shortened record.
    pub fn cut(&self, coil_id: &str, length_mm: f64) -> Result<Coil, Error> {
        self.farm.cut_coil(coil_id, length_mm)
    }

    /// Install a coil into a printer.
    pub async fn refill(&self, printer_id: &str, coil: Coil) -> Result<(), Error> {
        let printer = self.farm.printer(printer_id)?;
        let mut printer = printer.lock().await;
        let coil_id = coil.id.clone();
        printer.refill(coil)?;
        tracing::info!(printer_id, %coil_id, "coil installed");
        Ok(())
    }

    /// Detach a printer's coil and return it.
    pub async fn remove(&self, printer_id: &str) -> Result<Coil, Error> {
        let printer = self.farm.printer(printer_id)?;
        let mut printer = printer.lock().await;
        let coil = printer.remove_coil()?;
        tracing::info!(printer_id, coil_id = %coil.id, "coil removed");
        Ok(coil)
    }

    async fn spawn_loop(self: &Arc<Self>, printer_id: &str) -> Result<(), Error> {
        let mut active = self.active.lock().await;
        if let Some(task) = active.get(printer_id) {
            if !task.handle.is_finished() {
                return Err(Error::resource("Printer is already printing"));
            }
        }

        let (stop, mut stopped) = watch::channel(false);
        let engine = Arc::clone(self);
        let id = printer_id.to_owned();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(engine.config.tick_interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stopped.changed() => {
                        let printer = engine.farm.printer(&id)?;
                        printer.lock().await.cancel();
                        tracing::info!(printer_id = %id, "print stopped");
                        return Ok(());
                    }
                    _ = interval.tick() => {
                        match engine.tick(&id).await? {
                            TickOutcome::Progressed(_) => {}
                            TickOutcome::Completed(_) => return Ok(()),
                            TickOutcome::Faulted(fault) => {
                                if fault.is_recoverable() && engine.config.auto_resume {
                                    engine.farm.printer(&id)?.lock().await.resume()?;
                                } else {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
            }
        });

        active.insert(printer_id.to_owned(), PrintTask { handle, stop });
        Ok(())
    }
}
