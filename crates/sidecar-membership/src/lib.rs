//! The membership delegate: the bridge between the catalog and a
//! SWIM-style gossip substrate.

pub mod delegate;
pub mod error;

pub use delegate::{Delegate, NodeMeta};
pub use error::{Error, Result};
