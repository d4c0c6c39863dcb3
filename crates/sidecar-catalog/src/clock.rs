use chrono::{DateTime, Utc};

/// Clock is the single seam through which the catalog reads "now".
///
/// Production code uses [`UtcClock`]; tests use a steppable clock so that
/// lifespan/expiry assertions don't have to race the wall clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UtcClock;

impl Clock for UtcClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock fixed to a particular instant, advanced explicitly. Intended for tests.
pub struct FixedClock(std::sync::RwLock<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(std::sync::RwLock::new(at))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.0.write().unwrap();
        *guard += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.write().unwrap() = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.read().unwrap()
    }
}
