//! A command line interface for running a simulated 3D printer farm.

#![deny(missing_docs)]

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use print_farm::{Config, Engine, Farm, TickOutcome};
use tracing_subscriber::prelude::*;

/// This doc string acts as a help message when the user runs '--help'
/// as do all doc strings on fields.
#[derive(Parser, Debug, Clone)]
#[clap(version = clap::crate_version!(), author = clap::crate_authors!("\n"))]
pub struct Opts {
    /// Print debug info
    #[clap(short, long)]
    pub debug: bool,

    /// Print logs as json
    #[clap(short, long)]
    pub json: bool,

    /// The subcommand to run.
    #[clap(subcommand)]
    pub subcmd: SubCommand,

    /// Path to config file.
    #[clap(short, long, default_value = "print-farm.toml")]
    pub config: std::path::PathBuf,
}

/// A subcommand for our cli.
#[derive(Parser, Debug, Clone)]
pub enum SubCommand {
    /// List all printers in the fleet and their states.
    ListPrinters,

    /// Get a printer's status: state, progress, coil, and queue.
    GetStatus {
        /// Id for a printer
        printer_id: String,
    },

    /// Print the head of a printer's queue, driving the simulation until
    /// the job completes, faults, or runs out of filament.
    Print {
        /// Id for a printer
        printer_id: String,
    },

    /// Cut a length off a shelf coil.
    Cut {
        /// Id for a coil on the shelf
        coil_id: String,

        /// Length to cut off, in millimeters
        length_mm: f64,
    },

    /// Install a shelf coil into a printer.
    Refill {
        /// Id for a printer
        printer_id: String,

        /// Id for a coil on the shelf
        coil_id: String,
    },

    /// Remove a printer's coil and put it back on the shelf.
    RemoveCoil {
        /// Id for a printer
        printer_id: String,
    },

    /// Add a library figure to a printer's queue.
    Enqueue {
        /// Id for a printer
        printer_id: String,

        /// Id for a figure in the library
        figure_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    // Format fields using the provided closure.
    // We want to make this very concise otherwise the logs are not able to be read by humans.
    let format = tracing_subscriber::fmt::format::debug_fn(|writer, field, value| {
        if format!("{}", field) == "message" {
            write!(writer, "{}: {:?}", field, value)
        } else {
            write!(writer, "{}", field)
        }
    })
    // Separate each field with a comma.
    // This method is provided by an extension trait in the
    // `tracing-subscriber` prelude.
    .delimited(", ");

    let (json, plain) = if opts.json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().pretty().fmt_fields(format)))
    };

    let default_level = if opts.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry().with(filter).with(json).with(plain).init();

    let config = Config::from_file(&opts.config)?;

    if let Err(err) = run_cmd(&opts, &config).await {
        bail!("running cmd `{:?}` failed: {:?}", &opts.subcmd, err);
    }

    Ok(())
}

async fn run_cmd(opts: &Opts, config: &Config) -> Result<()> {
    let farm = Arc::new(Farm::from_config(config));
    let engine = Arc::new(Engine::new(Arc::clone(&farm), config.simulation.to_simulation_config()));

    match &opts.subcmd {
        SubCommand::ListPrinters => {
            for id in farm.printer_ids() {
                let printer = farm.printer(&id)?;
                let printer = printer.lock().await;
                println!("{}: {} ({}) [{}]", id, printer.name, printer.brand, printer.state());
            }
        }
        SubCommand::GetStatus { printer_id } => {
            let printer = farm.printer(printer_id)?;
            let printer = printer.lock().await;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&*printer)?);
            } else {
                println!("{:#?}", *printer);
            }
        }
        SubCommand::Print { printer_id } => {
            let mut events = engine.subscribe();
            engine.spawn(printer_id).await?;

            loop {
                let event = events.recv().await?;
                if event.printer_id != *printer_id {
                    continue;
                }
                match event.outcome {
                    TickOutcome::Progressed(progress) => println!("progress: {:.1}%", progress),
                    TickOutcome::Completed(job_id) => {
                        println!("completed figure {}", job_id);
                        break;
                    }
                    TickOutcome::Faulted(fault) => {
                        println!("fault: {}", fault);
                        if !(fault.is_recoverable() && config.simulation.auto_resume) {
                            break;
                        }
                    }
                }
            }

            engine.acknowledge(printer_id).await?;
        }
        SubCommand::Cut { coil_id, length_mm } => {
            let coil = engine.cut(coil_id, *length_mm)?;
            println!("{}: {:.1}mm left", coil.id, coil.length_mm);
        }
        SubCommand::Refill { printer_id, coil_id } => {
            let coil = farm.take_coil(coil_id)?;
            if let Err(err) = engine.refill(printer_id, coil.clone()).await {
                // put it back on the shelf
                farm.add_coil(coil);
                return Err(err.into());
            }
            println!("installed coil {} into {}", coil_id, printer_id);
        }
        SubCommand::RemoveCoil { printer_id } => {
            let coil = engine.remove(printer_id).await?;
            println!("removed coil {} ({:.1}mm left)", coil.id, coil.length_mm);
            farm.add_coil(coil);
        }
        SubCommand::Enqueue { printer_id, figure_id } => {
            let figure = farm.figure(figure_id)?;
            farm.add_to_queue(printer_id, figure).await?;
            println!("queued figure {} on {}", figure_id, printer_id);
        }
    }

    Ok(())
}
