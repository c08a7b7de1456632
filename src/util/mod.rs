//! Small utility helpers shared across the RF task core: hex formatting for
//! telemetry/debug output and the popcount helper used by FEC error tallying.

pub mod bitcount;
pub mod hex;

pub use bitcount::{hamming_distance, popcount_bytes, popcount_u8};
pub use hex::{decode_hex, encode_hex, format_hex_compact};
