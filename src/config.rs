//! Code for the configuration of the application.

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{coil::Coil, engine::SimulationConfig, fault::FaultInjector, figure::Figure, printer::Printer};

/// The configuration of the application: simulation policy plus the seed
/// records for the farm.
#[derive(Default, Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Simulation policy settings.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Printers in the fleet.
    #[serde(default)]
    pub printers: Vec<Printer>,

    /// Spare coils on the shelf.
    #[serde(default)]
    pub coils: Vec<Coil>,

    /// The figure library.
    #[serde(default)]
    pub figures: Vec<Figure>,
}

impl Config {
    /// Parse a configuration from a toml file.
    pub fn from_file(file: &PathBuf) -> Result<Self> {
        let config = std::fs::read_to_string(file)?;
        Self::from_str(&config)
    }

    /// Parse a configuration from a toml string.
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }
}

/// Simulation policy settings.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Milliseconds between ticks of a spawned print loop.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Resume automatically after a recoverable fault.
    #[serde(default)]
    pub auto_resume: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_resume: false,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    250
}

impl SimulationSettings {
    /// Convert into the engine's runtime config, with the default fault
    /// injection rates.
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            auto_resume: self.auto_resume,
            injector: FaultInjector::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_config_from_str_full() {
        let config = r#"
            [simulation]
            tick_interval_ms = 100
            auto_resume = true

            [[printers]]
            id = "p1"
            name = "Voron"
            brand = "LDO"
            speed_mm_per_sec = 50.0

            [[coils]]
            id = "c1"
            material = "PLA"
            color = "Black"
            length_mm = 10000.0

            [[figures]]
            id = "f1"
            name = "Benchy"
            perimeter_mm = 4000.0
        "#;
        let config = Config::from_str(config).unwrap();

        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert!(config.simulation.auto_resume);

        assert_eq!(config.printers.len(), 1);
        assert_eq!(config.printers[0].id, "p1");
        assert_eq!(config.printers[0].speed_mm_per_sec, 50.0);
        assert_eq!(config.printers[0].coil, None);
        assert!(config.printers[0].queue.is_empty());

        assert_eq!(config.coils.len(), 1);
        assert_eq!(config.coils[0].length_mm, 10000.0);

        assert_eq!(config.figures.len(), 1);
        assert!(!config.figures[0].is_completed);
    }

    #[test]
    fn test_config_from_str_defaults() {
        let config = r#"
            [[printers]]
            id = "p1"
            name = "Voron"
            brand = "LDO"
            speed_mm_per_sec = 50.0
        "#;
        let config = Config::from_str(config).unwrap();

        assert_eq!(config.simulation.tick_interval_ms, 250);
        assert!(!config.simulation.auto_resume);
        assert!(config.coils.is_empty());
        assert!(config.figures.is_empty());

        let sim = config.simulation.to_simulation_config();
        assert_eq!(sim.tick_interval, Duration::from_millis(250));
    }
}
