//! Clock port — local wall-clock time.

use chrono::NaiveDateTime;

/// Source of the local date and time that conditions are checked against.
pub trait Clock {
    /// Current local time in the configured timezone.
    fn now(&self) -> NaiveDateTime;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
