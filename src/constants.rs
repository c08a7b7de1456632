//! OGN protocol constants.
//!
//! Wire-format values that must match the OGN over-the-air format
//! bit-for-bit: anything touching frame layout is compatibility-critical.

/// Payload bytes per over-the-air frame (whitened position/status data).
pub const PACKET_PAYLOAD_LEN: usize = 20;

/// LDPC parity bytes appended to every frame.
pub const PACKET_FEC_LEN: usize = 6;

/// Total over-the-air frame length: 20 payload + 6 parity.
pub const PACKET_LEN: usize = PACKET_PAYLOAD_LEN + PACKET_FEC_LEN;

/// Bits in a full frame, used by the LDPC decoder.
pub const PACKET_BITS: usize = PACKET_LEN * 8;

/// `RxErr` values at or above this are rejected.
pub const MAX_RX_ERR: u8 = 16;

/// Maximum bit-flip decode iterations before giving up.
pub const LDPC_MAX_ITERATIONS: u8 = 24;

/// Relay queue fixed capacity.
pub const RELAY_QUEUE_CAPACITY: usize = 16;

/// Relay queue entry retention, in seconds.
pub const RELAY_ENTRY_LIFETIME_SECS: u8 = 30;

/// Sentinel time-of-second value marking a stale, GPS-lock-lost packet.
pub const TIME_STALE_SENTINEL: u8 = 0x3F;

/// GPS lock loss duration, in seconds, after which a Ready packet is marked
/// stale.
pub const GPS_LOCK_STALE_SECS: u32 = 30;

/// Consecutive seconds of zero received packets that trigger a suspected
/// chip wedge and a bring-up re-run.
pub const RX_DROUGHT_SECS: u32 = 60;

/// Region codes for the frequency plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Region {
    EuropeAfrica = 1,
    UsaCanada = 2,
    AustraliaSouthAmerica = 3,
}

/// Half-slot index within a UTC second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfSlot {
    A = 0,
    B = 1,
}

impl HalfSlot {
    pub fn other(self) -> HalfSlot {
        match self {
            HalfSlot::A => HalfSlot::B,
            HalfSlot::B => HalfSlot::A,
        }
    }
}
