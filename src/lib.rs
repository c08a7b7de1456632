//! # ogn-rf-core — RF task core for an OGN-compatible airborne beacon
//!
//! This crate implements the radio-facing half of an Open Glider Network
//! (OGN) tracker: PPS-synchronized half-slot scheduling, a (208,160) LDPC
//! packet codec, a fixed-capacity relay-priority queue, and a telemetry
//! formatter, driven by one [`rf_task::RfTask`] per-second cycle.
//!
//! ## Layout
//!
//! - [`constants`] — shared sizes, region table, half-slot enum
//! - [`error`] — the crate's error type
//! - [`logging`] — `env_logger` on hosted builds, `defmt`+RTT on bare metal
//! - [`util`] — hex formatting and popcount helpers
//! - [`config`] — the `Parameters` boundary (stand-in for flash-backed config)
//! - [`gps`] — the `GpsSource` boundary
//! - [`freq_plan`] — deterministic per-second channel/frequency selection
//! - [`rx_random`] — xorshift32 PRNG mixed with RSSI entropy
//! - [`tx_credit`] — saturating duty-cycle accountant
//! - [`rssi_lowpass`] — second-order IIR RSSI filter
//! - [`ldpc`] — the (208,160) FEC encoder/decoder
//! - [`packet`] — the position/status packet codec
//! - [`relay_queue`] — the 16-entry relay-priority queue
//! - [`transceiver`] — the chip-family-agnostic transceiver facade
//! - [`telemetry`] — NMEA-style sentence formatting and sinks
//! - [`rf_task`] — the per-second state machine binding everything together
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! ogn-rf-core = "0.1.0"
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod freq_plan;
pub mod gps;
pub mod ldpc;
pub mod logging;
pub mod packet;
pub mod relay_queue;
pub mod rf_task;
pub mod rssi_lowpass;
pub mod rx_random;
pub mod telemetry;
pub mod transceiver;
pub mod tx_credit;
pub mod util;

pub use config::{Parameters, StaticParameters};
pub use constants::{HalfSlot, Region};
pub use error::RfError;
pub use gps::{GpsSource, Position};
pub use logging::{init_logger, log_info};
pub use packet::{Packet, PacketFlags, RxPacket};
pub use relay_queue::RelayQueue;
pub use rf_task::{RfTask, RfTaskState};
pub use rssi_lowpass::RssiLowPass;
pub use rx_random::RxRandom;
pub use telemetry::TelemetryHub;
pub use transceiver::TransceiverFacade;
pub use tx_credit::TxCredit;

#[cfg(feature = "rtt-logging")]
pub mod defmt_timestamp;
