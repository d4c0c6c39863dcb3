use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::{Service, ServiceId};

/// One known host's services, per spec §3.
///
/// `last_changed` differs from `last_updated` only when a status-affecting
/// change occurred, letting consumers distinguish a routine refresh from an
/// actual transition without diffing the full service map themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Services")]
    pub services: HashMap<ServiceId, Service>,
    #[serde(rename = "LastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "LastChanged")]
    pub last_changed: DateTime<Utc>,
}

impl Server {
    pub fn new(name: String, at: DateTime<Utc>) -> Self {
        Server {
            name,
            services: HashMap::new(),
            last_updated: at,
            last_changed: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
