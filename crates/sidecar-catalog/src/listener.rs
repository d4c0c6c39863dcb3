use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};

use crate::error::{Error, Result};
use crate::service::{Service, Status};

/// A notification that a service's status transitioned, per spec §4.6.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub service: Service,
    pub previous_status: Status,
    pub changed_at: DateTime<Utc>,
}

/// The capability set a catalog subscriber must expose (spec §4.6, §9):
/// an event channel, a unique name, and whether it is a managed listener
/// whose presence is derived from discovery rather than registered by hand.
pub trait Listener: Send + Sync + 'static {
    fn chan(&self) -> &mpsc::Sender<ChangeEvent>;
    fn name(&self) -> &str;
    fn managed(&self) -> bool;
}

/// A plain [`Listener`] backed by an owned channel, sufficient for most
/// subscribers (HTTP watchers, URL-POST forwarders, Envoy xDS backends).
pub struct ChannelListener {
    name: String,
    managed: bool,
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChannelListener {
    pub fn new(name: impl Into<String>, managed: bool, capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            ChannelListener {
                name: name.into(),
                managed,
                tx,
            },
            rx,
        )
    }
}

impl Listener for ChannelListener {
    fn chan(&self) -> &mpsc::Sender<ChangeEvent> {
        &self.tx
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn managed(&self) -> bool {
        self.managed
    }
}

/// The catalog's set of registered listeners, keyed by name (spec §3, §4.6).
#[derive(Default)]
pub struct ListenerRegistry {
    inner: RwLock<HashMap<String, Arc<dyn Listener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Refuses an unbuffered channel (spec §4.6) and a
    /// duplicate name.
    pub async fn add(&self, listener: Arc<dyn Listener>) -> Result<()> {
        if listener.chan().max_capacity() == 0 {
            return Err(Error::UnbufferedListener(listener.name().to_string()));
        }
        let mut guard = self.inner.write().await;
        if guard.contains_key(listener.name()) {
            return Err(Error::DuplicateListener(listener.name().to_string()));
        }
        guard.insert(listener.name().to_string(), listener);
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NoSuchListener(name.to_string()))
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    pub async fn managed_names(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .values()
            .filter(|l| l.managed())
            .map(|l| l.name().to_string())
            .collect()
    }

    /// Snapshot the current listeners and deliver `event` to each via
    /// `try_send`, best-effort (spec §4.6, §4.7): a full channel drops the
    /// event for that listener only, and is logged, never blocking the
    /// emitter. The snapshot is taken before iterating, so a listener
    /// removed mid-fan-out still receives (or drops) this event (spec §9).
    pub async fn notify(&self, event: ChangeEvent) {
        let listeners: Vec<Arc<dyn Listener>> = self.inner.read().await.values().cloned().collect();
        for listener in listeners {
            if let Err(mpsc::error::TrySendError::Full(_)) = listener.chan().try_send(event.clone()) {
                tracing::warn!(listener = listener.name(), "dropping change event for full listener channel");
            }
        }
    }
}
