//! Dual-format codec for persisted scope records.
//!
//! - [`binary`]: versioned frames for the append-only audit store
//! - [`json`]: structured tree for streaming/text sinks
//!
//! Both formats carry the same logical content and both keep "block absent"
//! distinct from "block present with redacted names".

pub mod binary;
pub mod json;

pub use binary::{Decode, Decoder, Encode, Encoder, FRAME_HEADER_LEN, SCOPE_INFO_VERSION};
