//! The OGN position/status packet codec.

mod bits;
mod whitening;

pub use whitening::whiten;

use crate::constants::{PACKET_FEC_LEN, PACKET_LEN, PACKET_PAYLOAD_LEN, TIME_STALE_SENTINEL};
use crate::ldpc;
use bits::{read_bits, sign_extend, write_bits};
use bitflags::bitflags;

bitflags! {
    /// Packet flags: other/encrypted/stealth/emergency.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PacketFlags: u8 {
        const OTHER     = 0b0001;
        const ENCRYPTED = 0b0010;
        const STEALTH   = 0b0100;
        const EMERGENCY = 0b1000;
    }
}

/// Degrees-per-count scale for the 24-bit latitude field (±90°).
pub const LAT_COUNTS_PER_DEGREE: f64 = 93_206.0;
/// Degrees-per-count scale for the 24-bit longitude field (±180°).
pub const LON_COUNTS_PER_DEGREE: f64 = 46_603.0;
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// A decoded (or about-to-be-encoded) OGN position/status packet.
///
/// This is the 160-bit logical payload; `pack`/`unpack` convert to/from the
/// 20-byte wire representation, and `to_frame`/`from_frame` additionally
/// apply whitening and FEC to produce/consume the full 26-byte over-the-air
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    pub address: u32,
    pub addr_type: u8,
    pub flags: PacketFlags,
    pub relay_count: u8,
    pub time_of_second: u8,
    /// Latitude in `LAT_COUNTS_PER_DEGREE` units, signed.
    pub latitude: i32,
    /// Longitude in `LON_COUNTS_PER_DEGREE` units, signed.
    pub longitude: i32,
    /// Altitude in decameters.
    pub altitude_dam: u16,
    pub speed: u8,
    pub climb: i8,
    pub turn: i8,
    pub accel: i8,
    pub aircraft_type: u8,
}

impl Packet {
    /// XOR-parity over the 26 address + addr_type bits.
    pub fn compute_address_parity(address: u32, addr_type: u8) -> bool {
        let mut v = (address & 0x00FF_FFFF) ^ ((addr_type as u32) << 24);
        let mut parity = false;
        while v != 0 {
            parity ^= v & 1 != 0;
            v >>= 1;
        }
        parity
    }

    pub fn address_parity(&self) -> bool {
        Self::compute_address_parity(self.address, self.addr_type)
    }

    pub fn is_other(&self) -> bool {
        self.flags.contains(PacketFlags::OTHER)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(PacketFlags::ENCRYPTED)
    }

    /// Mark this packet's time field stale: GPS lock lost for more than
    /// 30 seconds while this packet is still the one being re-sent.
    pub fn mark_stale(&mut self) {
        self.time_of_second = TIME_STALE_SENTINEL;
    }

    pub fn is_stale(&self) -> bool {
        self.time_of_second == TIME_STALE_SENTINEL
    }

    /// Pack the logical fields into the 20-byte unwhitened payload.
    pub fn pack(&self) -> [u8; PACKET_PAYLOAD_LEN] {
        let mut buf = [0u8; PACKET_PAYLOAD_LEN];
        let mut pos = 0usize;
        write_bits(&mut buf, &mut pos, self.address & 0x00FF_FFFF, 24);
        write_bits(&mut buf, &mut pos, self.addr_type as u32, 2);
        write_bits(&mut buf, &mut pos, self.flags.bits() as u32, 4);
        write_bits(&mut buf, &mut pos, self.relay_count as u32, 4);
        write_bits(&mut buf, &mut pos, self.time_of_second as u32, 6);
        write_bits(&mut buf, &mut pos, self.address_parity() as u32, 1);
        write_bits(&mut buf, &mut pos, (self.latitude as u32) & 0x00FF_FFFF, 24);
        write_bits(&mut buf, &mut pos, (self.longitude as u32) & 0x00FF_FFFF, 24);
        write_bits(&mut buf, &mut pos, self.altitude_dam as u32, 13);
        write_bits(&mut buf, &mut pos, self.speed as u32, 8);
        write_bits(&mut buf, &mut pos, self.climb as u8 as u32, 8);
        write_bits(&mut buf, &mut pos, self.turn as u8 as u32, 8);
        write_bits(&mut buf, &mut pos, self.accel as u8 as u32, 8);
        write_bits(&mut buf, &mut pos, self.aircraft_type as u32, 4);
        write_bits(&mut buf, &mut pos, 0, 22); // reserved
        debug_assert_eq!(pos, PACKET_PAYLOAD_LEN * 8);
        buf
    }

    /// Unpack the 20-byte unwhitened payload into logical fields.
    pub fn unpack(buf: &[u8; PACKET_PAYLOAD_LEN]) -> Self {
        let mut pos = 0usize;
        let address = read_bits(buf, &mut pos, 24);
        let addr_type = read_bits(buf, &mut pos, 2) as u8;
        let flags = PacketFlags::from_bits_truncate(read_bits(buf, &mut pos, 4) as u8);
        let relay_count = read_bits(buf, &mut pos, 4) as u8;
        let time_of_second = read_bits(buf, &mut pos, 6) as u8;
        let _parity = read_bits(buf, &mut pos, 1);
        let latitude = sign_extend(read_bits(buf, &mut pos, 24), 24);
        let longitude = sign_extend(read_bits(buf, &mut pos, 24), 24);
        let altitude_dam = read_bits(buf, &mut pos, 13) as u16;
        let speed = read_bits(buf, &mut pos, 8) as u8;
        let climb = read_bits(buf, &mut pos, 8) as u8 as i8;
        let turn = read_bits(buf, &mut pos, 8) as u8 as i8;
        let accel = read_bits(buf, &mut pos, 8) as u8 as i8;
        let aircraft_type = read_bits(buf, &mut pos, 4) as u8;

        Self {
            address,
            addr_type,
            flags,
            relay_count,
            time_of_second,
            latitude,
            longitude,
            altitude_dam,
            speed,
            climb,
            turn,
            accel,
            aircraft_type,
        }
    }

    /// Whiten, compute FEC, and assemble the full 26-byte over-the-air
    /// frame.
    pub fn to_frame(&self) -> [u8; PACKET_LEN] {
        let mut payload = self.pack();
        whiten(&mut payload);
        let parity = ldpc::compute_fec(&payload);
        let mut frame = [0u8; PACKET_LEN];
        frame[..PACKET_PAYLOAD_LEN].copy_from_slice(&payload);
        frame[PACKET_PAYLOAD_LEN..].copy_from_slice(&parity);
        frame
    }

    /// Dewhiten an already-FEC-verified 20-byte payload and unpack it into
    /// logical fields.
    pub fn from_whitened_payload(payload: &[u8; PACKET_PAYLOAD_LEN]) -> Self {
        let mut p = *payload;
        whiten(&mut p); // self-inverse
        Self::unpack(&p)
    }

    /// FEC parity check over a full 26-byte frame; `0` means consistent.
    pub fn fec_check(frame: &[u8; PACKET_LEN]) -> u32 {
        ldpc::check(frame)
    }

    pub fn altitude_m(&self) -> i32 {
        self.altitude_dam as i32 * 10
    }

    /// Integer-meter (north, east) distance vector from a reference
    /// position, using a precomputed cosine of the reference latitude to
    /// avoid a trigonometric call per received packet.
    pub fn distance_vector_m(
        &self,
        ref_latitude: i32,
        ref_longitude: i32,
        ref_lat_cosine: f64,
    ) -> (i32, i32) {
        let dlat_deg = (self.latitude - ref_latitude) as f64 / LAT_COUNTS_PER_DEGREE;
        let dlon_deg = (self.longitude - ref_longitude) as f64 / LON_COUNTS_PER_DEGREE;
        let north_m = dlat_deg * METERS_PER_DEGREE_LAT;
        let east_m = dlon_deg * METERS_PER_DEGREE_LAT * ref_lat_cosine;
        (north_m.round() as i32, east_m.round() as i32)
    }

    /// `$POGNT` field body (without the leading `$POGNT,` tag or trailing
    /// checksum — see `telemetry::sentences`).
    pub fn write_pognt_fields(&self) -> String {
        format!(
            "{:06X},{:01X},{:01X},{:01X},{:02X},{:06X},{:06X},{:04X},{:02X},{:02X},{:02X},{:02X},{:01X}",
            self.address,
            self.addr_type,
            self.flags.bits(),
            self.relay_count,
            self.time_of_second,
            self.latitude as u32 & 0x00FF_FFFF,
            self.longitude as u32 & 0x00FF_FFFF,
            self.altitude_dam,
            self.speed,
            self.climb as u8,
            self.turn as u8,
            self.accel as u8,
            self.aircraft_type,
        )
    }

    /// `$PFLAA` field body for a relative-geometry display sentence.
    pub fn write_pflaa_fields(&self, north_m: i32, east_m: i32, alt_diff_m: i32) -> String {
        format!(
            "0,{north_m},{east_m},{alt_diff_m},{:01X},{:06X},,,{},{},{:01X}",
            self.addr_type, self.address, self.speed, self.climb, self.aircraft_type,
        )
    }
}

/// A received packet plus the reception-side bookkeeping.
#[derive(Debug, Clone, Copy)]
pub struct RxPacket {
    pub packet: Packet,
    pub rssi: u8,
    pub rx_err: u8,
    pub rank: i16,
    pub slot_time: u8,
    pub ready: bool,
}

impl RxPacket {
    pub fn is_acceptable(&self) -> bool {
        self.rx_err < crate::constants::MAX_RX_ERR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Packet {
        Packet {
            address: 0xABCDEF,
            addr_type: 1,
            flags: PacketFlags::empty(),
            relay_count: 2,
            time_of_second: 37,
            latitude: 4_000_000,
            longitude: -2_000_000,
            altitude_dam: 123,
            speed: 45,
            climb: -12,
            turn: 7,
            accel: -3,
            aircraft_type: 1,
        }
    }

    #[test]
    fn pack_unpack_round_trips() {
        let p = sample();
        let packed = p.pack();
        let unpacked = Packet::unpack(&packed);
        assert_eq!(p, unpacked);
    }

    #[test]
    fn to_frame_fec_checks_clean() {
        let p = sample();
        let frame = p.to_frame();
        assert_eq!(Packet::fec_check(&frame), 0);
    }

    #[test]
    fn whiten_dewhiten_round_trip_via_frame() {
        let p = sample();
        let frame = p.to_frame();
        let mut payload = [0u8; PACKET_PAYLOAD_LEN];
        payload.copy_from_slice(&frame[..PACKET_PAYLOAD_LEN]);
        let recovered = Packet::from_whitened_payload(&payload);
        assert_eq!(recovered, p);
    }

    #[test]
    fn address_parity_is_stable() {
        let p = sample();
        assert_eq!(
            p.address_parity(),
            Packet::compute_address_parity(p.address, p.addr_type)
        );
    }

    #[test]
    fn mark_stale_sets_sentinel() {
        let mut p = sample();
        p.mark_stale();
        assert!(p.is_stale());
        assert_eq!(p.time_of_second, TIME_STALE_SENTINEL);
    }

    #[test]
    fn distance_vector_is_zero_at_reference() {
        let p = sample();
        let (n, e) = p.distance_vector_m(p.latitude, p.longitude, 1.0);
        assert_eq!((n, e), (0, 0));
    }

    #[test]
    fn pognt_fields_are_well_formed_hex() {
        let p = sample();
        let fields = p.write_pognt_fields();
        assert!(fields.split(',').count() >= 10);
    }

    use proptest::prelude::*;

    proptest! {
        /// `pack`/`unpack` round-trips for any in-range field combination,
        /// not just the one hand-picked sample.
        #[test]
        fn pack_unpack_round_trips_for_arbitrary_fields(
            address in 0u32..=0x00FF_FFFF,
            addr_type in 0u8..=3,
            flags_bits in 0u8..=0b1111,
            relay_count in 0u8..=15,
            time_of_second in 0u8..=63,
            latitude in -(1i32 << 23)..(1i32 << 23),
            longitude in -(1i32 << 23)..(1i32 << 23),
            altitude_dam in 0u16..=8191,
            speed in any::<u8>(),
            climb in any::<i8>(),
            turn in any::<i8>(),
            accel in any::<i8>(),
            aircraft_type in 0u8..=15,
        ) {
            let p = Packet {
                address,
                addr_type,
                flags: PacketFlags::from_bits_truncate(flags_bits),
                relay_count,
                time_of_second,
                latitude,
                longitude,
                altitude_dam,
                speed,
                climb,
                turn,
                accel,
                aircraft_type,
            };
            let packed = p.pack();
            let unpacked = Packet::unpack(&packed);
            prop_assert_eq!(p, unpacked);
        }

        /// `dewhiten(whiten(P)) == P` for any 20-byte payload.
        #[test]
        fn whiten_is_self_inverse_for_arbitrary_payload(
            bytes in proptest::collection::vec(any::<u8>(), PACKET_PAYLOAD_LEN)
        ) {
            let mut payload = [0u8; PACKET_PAYLOAD_LEN];
            payload.copy_from_slice(&bytes);
            let mut once = payload;
            whiten(&mut once);
            let mut twice = once;
            whiten(&mut twice);
            prop_assert_eq!(twice, payload);
        }

        /// `FECcheck(P || FECcompute(P)) == 0` for any payload.
        #[test]
        fn fec_check_is_zero_for_arbitrary_clean_payload(
            bytes in proptest::collection::vec(any::<u8>(), PACKET_PAYLOAD_LEN)
        ) {
            let mut payload = [0u8; PACKET_PAYLOAD_LEN];
            payload.copy_from_slice(&bytes);
            let fec = ldpc::compute_fec(&payload);
            let mut frame = [0u8; PACKET_LEN];
            frame[..PACKET_PAYLOAD_LEN].copy_from_slice(&payload);
            frame[PACKET_PAYLOAD_LEN..].copy_from_slice(&fec);
            prop_assert_eq!(Packet::fec_check(&frame), 0);
        }
    }
}
