//! Deferred event delivery.
//!
//! Mutating book operations append [`BookEvent`]s here instead of calling
//! the listener synchronously, so listener code can never re-enter the
//! book mid-match. A flush drains the queue to the listener in FIFO
//! emission order.

use std::collections::VecDeque;

use tickbook_types::{BookEvent, OrderListener};

/// FIFO queue of pending lifecycle events.
#[derive(Debug, Default)]
pub struct CallbackQueue {
    events: VecDeque<BookEvent>,
}

impl CallbackQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the next flush.
    pub fn push(&mut self, event: BookEvent) {
        self.events.push_back(event);
    }

    /// Number of queued, undelivered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Deliver every queued event to `listener` in emission order, then
    /// clear the queue.
    pub fn drain_into(&mut self, listener: &mut dyn OrderListener) {
        while let Some(event) = self.events.pop_front() {
            dispatch(event, listener);
        }
    }
}

/// Route one event record to its listener callback.
fn dispatch(event: BookEvent, listener: &mut dyn OrderListener) {
    match event {
        BookEvent::Accept { order } => listener.on_accept(&order),
        BookEvent::Fill {
            order,
            matched_order,
            fill_qty,
            fill_price,
        } => listener.on_fill(&order, &matched_order, fill_qty, fill_price),
        BookEvent::Reject { order, reason } => listener.on_reject(&order, reason),
        BookEvent::Cancel { order } => listener.on_cancel(&order),
        BookEvent::CancelReject { order_id, reason } => listener.on_cancel_reject(&order_id, reason),
        BookEvent::Replace {
            order,
            qty_delta,
            new_price,
        } => listener.on_replace(&order, qty_delta, new_price),
        BookEvent::ReplaceReject { order_id, reason } => listener.on_replace_reject(&order_id, reason),
    }
}

#[cfg(test)]
mod tests {
    use tickbook_types::{Order, RejectReason, Side};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl OrderListener for Recorder {
        fn on_accept(&mut self, order: &Order) {
            self.log.push(format!("accept:{}", order.id));
        }
        fn on_reject(&mut self, order: &Order, reason: RejectReason) {
            self.log.push(format!("reject:{}:{reason}", order.id));
        }
        fn on_cancel(&mut self, order: &Order) {
            self.log.push(format!("cancel:{}", order.id));
        }
    }

    #[test]
    fn drains_in_emission_order() {
        let mut queue = CallbackQueue::new();
        queue.push(BookEvent::Accept {
            order: Order::limit("O1", Side::Buy, 5000, 100),
        });
        queue.push(BookEvent::Cancel {
            order: Order::limit("O1", Side::Buy, 5000, 100),
        });
        assert_eq!(queue.len(), 2);

        let mut recorder = Recorder::default();
        queue.drain_into(&mut recorder);

        assert_eq!(recorder.log, vec!["accept:O1", "cancel:O1"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn flush_is_idempotent_when_empty() {
        let mut queue = CallbackQueue::new();
        let mut recorder = Recorder::default();
        queue.drain_into(&mut recorder);
        queue.drain_into(&mut recorder);
        assert!(recorder.log.is_empty());
    }

    #[test]
    fn reason_passes_through() {
        let mut queue = CallbackQueue::new();
        queue.push(BookEvent::Reject {
            order: Order::limit("O1", Side::Buy, 5000, 0),
            reason: RejectReason::ZeroQuantity,
        });

        let mut recorder = Recorder::default();
        queue.drain_into(&mut recorder);
        assert_eq!(recorder.log, vec!["reject:O1:quantity must be positive"]);
    }
}
