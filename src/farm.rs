//! In-memory stores for the farm's printers, spare coils, and figure
//! library.
//!
//! This is the record surface a persistence layer would back in the full
//! system; here it is plain id-keyed CRUD. Every operation returns the
//! updated record or fails, so callers never observe half-applied writes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{coil::Coil, config::Config, error::Error, figure::Figure, printer::Printer};

/// The whole farm: the printer fleet plus the shelf of spare coils and
/// the figure library.
///
/// Printers are held behind per-printer mutexes; everything that touches
/// one printer locks it for the whole operation, which is what keeps
/// refills and removals from interleaving with a simulation tick.
#[derive(Default)]
pub struct Farm {
    printers: DashMap<String, Arc<Mutex<Printer>>>,
    coils: DashMap<String, Coil>,
    figures: DashMap<String, Figure>,
}

impl Farm {
    /// An empty farm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a farm from the records in a configuration file.
    pub fn from_config(config: &Config) -> Self {
        let farm = Self::new();
        for printer in &config.printers {
            farm.add_printer(printer.clone());
        }
        for coil in &config.coils {
            farm.add_coil(coil.clone());
        }
        for figure in &config.figures {
            farm.add_figure(figure.clone());
        }
        farm
    }

    /// Add a printer to the fleet, returning its id.
    pub fn add_printer(&self, printer: Printer) -> String {
        let id = printer.id.clone();
        self.printers.insert(id.clone(), Arc::new(Mutex::new(printer)));
        id
    }

    /// Shared handle to a printer.
    pub fn printer(&self, id: &str) -> Result<Arc<Mutex<Printer>>, Error> {
        self.printers
            .get(id)
            .map(|printer| Arc::clone(&printer))
            .ok_or_else(|| Error::not_found("printer", id))
    }

    /// Remove a printer from the fleet.
    pub fn delete_printer(&self, id: &str) -> Result<(), Error> {
        self.printers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("printer", id))
    }

    /// Ids of every printer in the fleet, sorted.
    pub fn printer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.printers.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Put a coil on the shelf, returning its id.
    pub fn add_coil(&self, coil: Coil) -> String {
        let id = coil.id.clone();
        self.coils.insert(id.clone(), coil);
        id
    }

    /// Read a shelf coil.
    pub fn coil(&self, id: &str) -> Result<Coil, Error> {
        self.coils
            .get(id)
            .map(|coil| coil.clone())
            .ok_or_else(|| Error::not_found("coil", id))
    }

    /// Replace a shelf coil record, returning the updated record.
    pub fn update_coil(&self, coil: Coil) -> Result<Coil, Error> {
        let mut entry = self
            .coils
            .get_mut(&coil.id)
            .ok_or_else(|| Error::not_found("coil", &coil.id))?;
        *entry = coil.clone();
        Ok(coil)
    }

    /// Delete a shelf coil.
    pub fn delete_coil(&self, id: &str) -> Result<(), Error> {
        self.coils
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("coil", id))
    }

    /// Take a coil off the shelf, e.g. for installation into a printer.
    pub fn take_coil(&self, id: &str) -> Result<Coil, Error> {
        self.coils
            .remove(id)
            .map(|(_, coil)| coil)
            .ok_or_else(|| Error::not_found("coil", id))
    }

    /// Shelf coils, sorted by id.
    pub fn coils(&self) -> Vec<Coil> {
        let mut coils: Vec<Coil> = self.coils.iter().map(|entry| entry.value().clone()).collect();
        coils.sort_by(|a, b| a.id.cmp(&b.id));
        coils
    }

    /// Cut a shelf coil in place, returning the shortened record.
    pub fn cut_coil(&self, id: &str, cut_length: f64) -> Result<Coil, Error> {
        let mut entry = self.coils.get_mut(id).ok_or_else(|| Error::not_found("coil", id))?;
        let cut = entry.cut(cut_length)?;
        *entry = cut.clone();
        Ok(cut)
    }

    /// Add a figure to the library, returning its id.
    pub fn add_figure(&self, figure: Figure) -> String {
        let id = figure.id.clone();
        self.figures.insert(id.clone(), figure);
        id
    }

    /// Read a library figure.
    pub fn figure(&self, id: &str) -> Result<Figure, Error> {
        self.figures
            .get(id)
            .map(|figure| figure.clone())
            .ok_or_else(|| Error::not_found("figure", id))
    }

    /// Replace a library figure record, returning the updated record.
    pub fn update_figure(&self, figure: Figure) -> Result<Figure, Error> {
        let mut entry = self
            .figures
            .get_mut(&figure.id)
            .ok_or_else(|| Error::not_found("figure", &figure.id))?;
        *entry = figure.clone();
        Ok(figure)
    }

    /// Delete a library figure.
    pub fn delete_figure(&self, id: &str) -> Result<(), Error> {
        self.figures
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("figure", id))
    }

    /// Mark a library figure as completed, returning the updated record.
    pub fn mark_completed(&self, id: &str) -> Result<Figure, Error> {
        let mut entry = self.figures.get_mut(id).ok_or_else(|| Error::not_found("figure", id))?;
        entry.is_completed = true;
        Ok(entry.clone())
    }

    /// Library figures that have not been printed yet, sorted by name.
    pub fn blueprints(&self) -> Vec<Figure> {
        self.figures_where(|figure| !figure.is_completed)
    }

    /// Library figures that have been printed, sorted by name.
    pub fn completed_figures(&self) -> Vec<Figure> {
        self.figures_where(|figure| figure.is_completed)
    }

    /// Drop every completed figure from the library.
    pub fn delete_completed_figures(&self) {
        self.figures.retain(|_, figure| !figure.is_completed);
    }

    fn figures_where(&self, keep: impl Fn(&Figure) -> bool) -> Vec<Figure> {
        let mut figures: Vec<Figure> = self
            .figures
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        figures.sort_by(|a, b| a.name.cmp(&b.name));
        figures
    }

    /// Enqueue a figure onto a printer's queue.
    pub async fn add_to_queue(&self, printer_id: &str, figure: Figure) -> Result<(), Error> {
        let printer = self.printer(printer_id)?;
        printer.lock().await.queue.enqueue(figure);
        Ok(())
    }

    /// Remove a queued figure by id, returning it.
    pub async fn remove_from_queue(&self, printer_id: &str, figure_id: &str) -> Result<Figure, Error> {
        let printer = self.printer(printer_id)?;
        let mut printer = printer.lock().await;
        printer
            .queue
            .remove_by_id(figure_id)
            .ok_or_else(|| Error::not_found("figure", figure_id))
    }

    /// Replace a queued figure with an edited record.
    pub async fn edit_in_queue(&self, printer_id: &str, figure: Figure) -> Result<(), Error> {
        let printer = self.printer(printer_id)?;
        let mut printer = printer.lock().await;
        let figure_id = figure.id.clone();
        if printer.queue.edit_by_id(figure) {
            Ok(())
        } else {
            Err(Error::not_found("figure", &figure_id))
        }
    }

    /// Drop every figure from a printer's queue.
    pub async fn clear_queue(&self, printer_id: &str) -> Result<(), Error> {
        let printer = self.printer(printer_id)?;
        printer.lock().await.queue.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn coil_crud_round_trips() -> TestResult {
        let farm = Farm::new();
        let id = farm.add_coil(Coil::new("PLA", "Black", 1000.0));

        let mut coil = farm.coil(&id)?;
        coil.color = "White".to_owned();
        let updated = farm.update_coil(coil)?;
        assert_eq!(farm.coil(&id)?, updated);

        farm.delete_coil(&id)?;
        let err = farm.coil(&id).unwrap_err();
        assert_eq!(err.to_string(), format!("coil not found by id: {}", id));
        Ok(())
    }

    #[test]
    fn updating_a_missing_record_fails() {
        let farm = Farm::new();
        let err = farm.update_coil(Coil::new("PLA", "Black", 1.0)).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "coil", .. }));

        let err = farm.update_figure(Figure::new("Benchy", 5.0)).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "figure", .. }));
    }

    #[test]
    fn cut_coil_persists_the_shortened_record() -> TestResult {
        let farm = Farm::new();
        let id = farm.add_coil(Coil::new("PLA", "Black", 1000.0));

        assert_eq!(farm.cut_coil(&id, 200.0)?.length_mm, 800.0);
        assert_eq!(farm.cut_coil(&id, 300.0)?.length_mm, 500.0);

        let err = farm.cut_coil(&id, 1500.0).unwrap_err();
        assert_eq!(err.to_string(), "Cut length is bigger than coil length");
        assert_eq!(farm.coil(&id)?.length_mm, 500.0);
        Ok(())
    }

    #[test]
    fn take_coil_removes_it_from_the_shelf() -> TestResult {
        let farm = Farm::new();
        let id = farm.add_coil(Coil::new("PLA", "Black", 1000.0));

        farm.take_coil(&id)?;
        assert!(farm.take_coil(&id).is_err());
        assert!(farm.coils().is_empty());
        Ok(())
    }

    #[test]
    fn library_splits_blueprints_from_completed() -> TestResult {
        let farm = Farm::new();
        let benchy = farm.add_figure(Figure::new("Benchy", 4000.0));
        farm.add_figure(Figure::new("Cube", 800.0));

        farm.mark_completed(&benchy)?;

        let blueprints: Vec<String> = farm.blueprints().into_iter().map(|f| f.name).collect();
        assert_eq!(blueprints, vec!["Cube"]);
        let completed: Vec<String> = farm.completed_figures().into_iter().map(|f| f.name).collect();
        assert_eq!(completed, vec!["Benchy"]);

        farm.delete_completed_figures();
        assert!(farm.completed_figures().is_empty());
        assert_eq!(farm.blueprints().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn queue_surface_is_ordered_and_atomic_per_printer() -> TestResult {
        let farm = Farm::new();
        let printer_id = farm.add_printer(Printer::new("Printer1", "Brand1", 50.0));

        let first = Figure::new("First", 5.0);
        let second = Figure::new("Second", 7.0);
        farm.add_to_queue(&printer_id, first.clone()).await?;
        farm.add_to_queue(&printer_id, second.clone()).await?;

        let mut edited = second.clone();
        edited.perimeter_mm = 9.0;
        farm.edit_in_queue(&printer_id, edited.clone()).await?;

        let removed = farm.remove_from_queue(&printer_id, &first.id).await?;
        assert_eq!(removed, first);

        {
            let printer = farm.printer(&printer_id)?;
            let printer = printer.lock().await;
            assert_eq!(printer.queue.head(), Some(&edited));
        }

        farm.clear_queue(&printer_id).await?;
        let printer = farm.printer(&printer_id)?;
        assert!(printer.lock().await.queue.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn queue_surface_rejects_unknown_printers_and_figures() {
        let farm = Farm::new();
        let err = farm.clear_queue("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "printer not found by id: nope");

        let printer_id = farm.add_printer(Printer::new("Printer1", "Brand1", 50.0));
        let err = farm.remove_from_queue(&printer_id, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "figure not found by id: nope");
    }
}
