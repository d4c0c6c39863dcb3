use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::RETRANSMIT_NUDGE;

pub type Hostname = String;
pub type ServiceId = String;

/// Status of a service instance, per spec §3 and the stable wire codes of §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Alive,
    Tombstone,
    Unhealthy,
    Unknown,
    Draining,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Alive => 0,
            Status::Tombstone => 1,
            Status::Unhealthy => 2,
            Status::Unknown => 3,
            Status::Draining => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Status::Alive,
            1 => Status::Tombstone,
            2 => Status::Unhealthy,
            3 => Status::Unknown,
            4 => Status::Draining,
            _ => return None,
        })
    }
}

// Serialized as the stable integer code rather than derived, so the wire
// value can never drift if variants are reordered (SPEC_FULL §3).
impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let code = u8::deserialize(deserializer)?;
        Status::from_code(code).ok_or_else(|| D::Error::custom(format!("invalid status code: {code}")))
    }
}

/// The proxy mode a service instance expects, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    Http,
    Tcp,
}

/// A single exposed port, per spec §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "ServicePort")]
    pub service_port: u16,
    #[serde(rename = "IP")]
    pub ip: Option<std::net::IpAddr>,
}

/// One service instance, the unit of information the gossip protocol exchanges.
///
/// `Updated` is assigned on the owning host only; comparisons across hosts
/// rely on this field alone (spec §3's invariant), so `Service` carries no
/// external context peers would need to merge it correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "ID")]
    pub id: ServiceId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Hostname")]
    pub hostname: Hostname,
    #[serde(rename = "Created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "Updated")]
    pub updated: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "ProxyMode")]
    pub proxy_mode: ProxyMode,
    #[serde(rename = "Ports")]
    pub ports: Vec<Port>,
}

impl Service {
    pub fn is_tombstone(&self) -> bool {
        self.status == Status::Tombstone
    }

    /// Whether `self` would invalidate (should overwrite) `existing`, per
    /// spec §4.1: a different status, or a strictly newer `Updated`.
    pub fn invalidates(&self, existing: &Service) -> bool {
        self.status != existing.status || self.updated > existing.updated
    }

    /// Mark this service tombstoned, advancing `Updated` to `at` (spec §3).
    pub fn tombstone_at(&mut self, at: DateTime<Utc>) {
        self.status = Status::Tombstone;
        self.updated = at;
    }

    /// Advance `Updated` by the per-retransmission nudge (spec §4.2), so a
    /// repeated broadcast of the same record is treated by peers as
    /// strictly newer without changing its substantive content.
    pub fn nudge_for_retransmit(&mut self) {
        self.updated += RETRANSMIT_NUDGE;
    }
}
