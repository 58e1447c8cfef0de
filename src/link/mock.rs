//! Scripted in-memory link for tests and development

use std::collections::VecDeque;

use crate::link::{LinkError, LinkResult, RangeLink};

/// Range link backed by a queue of pre-scripted chunks
pub struct MockLink {
    id: u8,
    chunks: VecDeque<Vec<u8>>,
    connected: bool,
    disconnect_when_drained: bool,
}

impl MockLink {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            chunks: VecDeque::new(),
            connected: true,
            disconnect_when_drained: false,
        }
    }

    /// Report a disconnect once the scripted chunks run out, instead of
    /// idling forever
    pub fn disconnect_when_drained(mut self) -> Self {
        self.disconnect_when_drained = true;
        self
    }

    /// Queue a raw chunk exactly as the transport would deliver it
    pub fn push_chunk(&mut self, bytes: impl Into<Vec<u8>>) {
        self.chunks.push_back(bytes.into());
    }

    /// Queue a protocol line, newline-terminated
    pub fn push_line(&mut self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.chunks.push_back(bytes);
    }

    /// Simulate losing the transport
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn queued_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl RangeLink for MockLink {
    fn read_chunk(&mut self) -> LinkResult<Option<Vec<u8>>> {
        if !self.connected {
            return Err(LinkError::Disconnected { link_id: self.id });
        }
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None if self.disconnect_when_drained => {
                self.connected = false;
                Err(LinkError::Disconnected { link_id: self.id })
            }
            None => Ok(None),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn link_id(&self) -> u8 {
        self.id
    }
}
