//! shapetally-export: Pure output serializers (sans-IO)
//!
//! Turns a pipeline result into what leaves the process: the annotated
//! canvas as JPEG bytes, and the JSON result payload with the count
//! table. Nothing here touches the filesystem or the network.

pub mod jpeg;
pub mod payload;

pub use jpeg::{DEFAULT_JPEG_QUALITY, ExportError, encode_jpeg};
pub use payload::{CategoryEntry, ResultPayload};
