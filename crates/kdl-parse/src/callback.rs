//! Receiver side of the event parser.

use crate::Event;

/// Receives parse events in document order.
pub trait ParseCallback<'src> {
    /// Called once per event.
    fn event(&mut self, event: Event<'src>);
}

impl<'src> ParseCallback<'src> for Vec<Event<'src>> {
    fn event(&mut self, event: Event<'src>) {
        self.push(event);
    }
}
