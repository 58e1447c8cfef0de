//! Stream decoding for the ranging protocol

pub mod decoder;

pub use decoder::{LineDecoder, RangeRecord};
