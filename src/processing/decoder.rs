//! Newline-delimited ranging record decoder
//!
//! The transport delivers ASCII records of the form
//!
//! ```text
//! DIST 1.20 2.35 3.10
//! RSSI -58.0 -63.5 -71.2
//! ```
//!
//! one per line, but fragments them arbitrarily: a record may arrive split
//! across several chunks, or several records may arrive in one chunk. The
//! decoder keeps the trailing unterminated bytes between calls so record
//! boundaries never depend on chunk boundaries.
//!
//! A malformed line (unknown prefix, too few fields, non-numeric or
//! non-finite value) is dropped and decoding continues with the next line;
//! a single corrupted record must never stall the stream.

use crate::core::{MAX_CARRY_BYTES, MIN_RECORD_VALUES};

/// One complete ranging record, values in transmission (anchor slot) order
#[derive(Debug, Clone, PartialEq)]
pub enum RangeRecord {
    /// `DIST` line: range from the UE to each anchor slot (meters)
    Distances(Vec<f64>),
    /// `RSSI` line: signal strength per anchor slot (dBm)
    Signals(Vec<f64>),
}

/// Incremental decoder with carry-over buffering across chunk boundaries
#[derive(Debug, Default)]
pub struct LineDecoder {
    carry: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and decode every line completed by it. The trailing
    /// incomplete line, if any, is buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RangeRecord> {
        self.carry.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(newline) = self.carry.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.carry.drain(..=newline).collect();
            match parse_line(&line[..newline]) {
                Some(record) => records.push(record),
                None => {
                    if !line[..newline].iter().all(u8::is_ascii_whitespace) {
                        log::debug!(
                            "dropping malformed record: {:?}",
                            String::from_utf8_lossy(&line[..newline])
                        );
                    }
                }
            }
        }

        // A transport spewing garbage without newlines must not grow the
        // carry buffer without bound
        if self.carry.len() > MAX_CARRY_BYTES {
            log::debug!(
                "discarding {} unterminated bytes from carry buffer",
                self.carry.len()
            );
            self.carry.clear();
        }

        records
    }

    /// Bytes currently buffered while waiting for a terminating newline
    pub fn pending_bytes(&self) -> usize {
        self.carry.len()
    }

    /// Drop any buffered partial line, e.g. after a transport reconnect
    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

fn parse_line(raw: &[u8]) -> Option<RangeRecord> {
    let line = std::str::from_utf8(raw).ok()?;
    let mut fields = line.split_whitespace();
    let prefix = fields.next()?;

    let values: Vec<f64> = fields
        .map(|field| field.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;
    if values.len() < MIN_RECORD_VALUES {
        return None;
    }

    match prefix {
        "DIST" => Some(RangeRecord::Distances(values)),
        "RSSI" => Some(RangeRecord::Signals(values)),
        _ => None,
    }
}
