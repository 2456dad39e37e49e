//!
//! A utility to print progress information for procedures whose duration is
//! not known up front. Avoids writing too many progress messages by only
//! printing at a fixed time interval.
//!

use std::cell::RefCell;
use std::marker::PhantomData;
use std::time::Duration;
use std::time::Instant;

/// A time-based progress tracker that prints messages at regular intervals.
pub struct TimeProgress<T> {
    interval: Duration,
    last_update: RefCell<Instant>,
    message: Box<dyn Fn(T)>,
    _marker: PhantomData<T>,
}

impl<T> TimeProgress<T> {
    /// Create a new time-based progress tracker with a given interval in seconds.
    pub fn new(message: impl Fn(T) + 'static, interval_seconds: u64) -> TimeProgress<T> {
        TimeProgress {
            message: Box::new(message),
            interval: Duration::from_secs(interval_seconds),
            last_update: RefCell::new(Instant::now()),
            _marker: PhantomData,
        }
    }

    /// Report the given progress object, printing a message whenever the
    /// configured interval has passed since the previous message.
    pub fn print(&self, object: T) {
        let now = Instant::now();
        let should_print = {
            let last = *self.last_update.borrow();
            now.duration_since(last) >= self.interval
        };
        if should_print {
            (self.message)(object);
            *self.last_update.borrow_mut() = now;
        }
    }
}
