//! Per-thread record of fixture events.
//!
//! Each test thread gets its own ledger; call [`reset`] at the start of a
//! test that reads it.

use std::cell::RefCell;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Append an event.
pub fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

/// Clear the ledger.
pub fn reset() {
    EVENTS.with(|events| events.borrow_mut().clear());
}

/// Drain the ledger, returning events in the order they were recorded.
pub fn take() -> Vec<String> {
    EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

/// How many times `event` was recorded, without draining.
pub fn count(event: &str) -> usize {
    EVENTS.with(|events| events.borrow().iter().filter(|seen| *seen == event).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn take_drains_in_order() {
        reset();
        record("first");
        record(String::from("second"));
        record("first");
        assert_eq!(count("first"), 2);
        assert_eq!(take(), ["first", "second", "first"]);
        assert!(take().is_empty());
    }
}
