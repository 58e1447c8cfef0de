//! Transport abstraction for the ranging byte stream
//!
//! The engine does not know where its bytes come from. A [`RangeLink`]
//! hands over whatever the transport delivered, fragmented however the
//! transport fragments it; reconnection and backoff live outside the
//! engine. The crate ships only the in-memory [`MockLink`]; a serial or
//! network link implements the same trait in the integrating application.

pub mod mock;
pub mod reader;

pub use mock::MockLink;
pub use reader::{shared_engine, spawn_reader, ReaderHandle, SharedEngine};

use std::fmt;

/// Link failure surfaced to the reader loop
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The transport is no longer connected
    Disconnected { link_id: u8 },
    /// Transport-level read failure
    Io { link_id: u8, details: String },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Disconnected { link_id } => {
                write!(f, "Link {} disconnected", link_id)
            }
            LinkError::Io { link_id, details } => {
                write!(f, "Link {} read failed: {}", link_id, details)
            }
        }
    }
}

impl std::error::Error for LinkError {}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Byte-chunk source of ranging records
pub trait RangeLink: Send {
    /// Read the next chunk of bytes.
    /// Returns `Ok(Some(chunk))` when bytes arrived,
    /// `Ok(None)` when nothing is pending (non-blocking),
    /// `Err` when the transport failed.
    fn read_chunk(&mut self) -> LinkResult<Option<Vec<u8>>>;

    fn is_connected(&self) -> bool;

    /// Identifier used in diagnostics
    fn link_id(&self) -> u8;
}
