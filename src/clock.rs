#[cfg(test)]
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// Source of the current time for expiry checks.
#[derive(Clone, Debug, Default)]
pub enum Clock {
    #[default]
    System,
    /// Only moves when told to.
    #[cfg(test)]
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            #[cfg(test)]
            Clock::Manual(now) => *now.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

#[cfg(test)]
impl Clock {
    pub fn manual(start: DateTime<Utc>) -> Self {
        Clock::Manual(Arc::new(Mutex::new(start)))
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Clock::Manual(now) = self {
            *now.lock().unwrap() += by;
        }
    }
}
