//! The ordered print queue belonging to one printer.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::figure::Figure;

/// Ordered sequence of figures waiting to be printed by one printer.
///
/// While the printer is printing, the head of the queue is the active job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobQueue {
    jobs: VecDeque<Figure>,
}

impl JobQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no work is queued.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of queued figures.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// The figure that is (or would become) the active job.
    pub fn head(&self) -> Option<&Figure> {
        self.jobs.front()
    }

    /// Append a figure to the back of the queue.
    pub fn enqueue(&mut self, figure: Figure) {
        self.jobs.push_back(figure);
    }

    /// Remove and return the head of the queue.
    pub fn dequeue_head(&mut self) -> Option<Figure> {
        self.jobs.pop_front()
    }

    /// Remove a queued figure by id, returning it if it was present.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Figure> {
        let index = self.jobs.iter().position(|figure| figure.id == id)?;
        self.jobs.remove(index)
    }

    /// Replace the queued figure carrying the same id as `figure`. Returns
    /// false if no such figure is queued.
    pub fn edit_by_id(&mut self, figure: Figure) -> bool {
        match self.jobs.iter_mut().find(|queued| queued.id == figure.id) {
            Some(queued) => {
                *queued = figure;
                true
            }
            None => false,
        }
    }

    /// Drop every queued figure.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Iterate the queued figures, front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Figure> {
        self.jobs.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn figure(id: &str) -> Figure {
        Figure {
            id: id.to_owned(),
            name: format!("Figure{}", id),
            perimeter_mm: 5.0,
            is_completed: false,
        }
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = JobQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(figure("1"));
        queue.enqueue(figure("2"));
        queue.enqueue(figure("3"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.head().unwrap().id, "1");
        assert_eq!(queue.dequeue_head().unwrap().id, "1");
        assert_eq!(queue.head().unwrap().id, "2");
    }

    #[test]
    fn remove_by_id_keeps_the_rest_in_order() {
        let mut queue = JobQueue::new();
        queue.enqueue(figure("1"));
        queue.enqueue(figure("2"));
        queue.enqueue(figure("3"));

        assert_eq!(queue.remove_by_id("2").unwrap().id, "2");
        assert!(queue.remove_by_id("2").is_none());

        let ids: Vec<&str> = queue.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn edit_by_id_replaces_in_place() {
        let mut queue = JobQueue::new();
        queue.enqueue(figure("1"));
        queue.enqueue(figure("2"));

        let mut edited = figure("2");
        edited.perimeter_mm = 42.0;
        assert!(queue.edit_by_id(edited));
        assert!(!queue.edit_by_id(figure("9")));

        assert_eq!(queue.iter().nth(1).unwrap().perimeter_mm, 42.0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = JobQueue::new();
        queue.enqueue(figure("1"));
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.head().is_none());
    }
}
