//! RF Task Loop: the per-second state machine binding
//! every other component together. All mutable state lives in one
//! [`RfTaskState`] owned by [`RfTask`] and threaded through by `&mut self` —
//! nothing here is a `static`.

pub mod bringup;
pub mod time_slot;

use crate::config::Parameters;
use crate::constants::{
    HalfSlot, Region, GPS_LOCK_STALE_SECS, PACKET_LEN, RX_DROUGHT_SECS,
};
use crate::error::RfError;
use crate::freq_plan;
use crate::gps::{GpsSource, Position};
use crate::ldpc::LdpcDecoder;
use crate::packet::{Packet, PacketFlags, RxPacket};
use crate::relay_queue::RelayQueue;
use crate::rssi_lowpass::RssiLowPass;
use crate::rx_random::RxRandom;
use crate::telemetry::TelemetryHub;
use crate::transceiver::TransceiverFacade;
use crate::tx_credit::TxCredit;
use std::sync::Arc;
use time_slot::{time_slot, TimeSlotParams};

const HALF_SLOT_MS: u32 = 500;
const TX_SLOT_MS: u32 = 400;
const LBT_MAX_WAIT_MS: u32 = 8;
const NOISE_THRESHOLD: u8 = 200;
const SYNC_WORD: [u8; 8] = [0xF7, 0x2D, 0x96, 0xC9, 0x26, 0xDC, 0x93, 0x10];

/// Every formerly-global mutable quantity the original firmware's RF task
/// owned, now collected into one task-local record.
pub struct RfTaskState {
    pub tx_credit: TxCredit,
    pub rx_random: RxRandom,
    pub relay_queue: RelayQueue,
    pub rssi_lowpass: RssiLowPass,
    pub rx_channel: u8,
    pub rx_unix_time: u32,
    pub curr_pos_packet: Option<Packet>,
    pub region: Region,
    /// Per-second bins of packets successfully decoded, indexed by
    /// `unix_time % 64`, so `pkt_count_64()` reports a trailing 64-second
    /// rolling count rather than a lifetime total.
    pkt_count_bins: [u32; 64],
    /// Consecutive seconds with zero received packets.
    pub rx_idle_seconds: u32,
    pub gps_stale_seconds: u32,
}

impl RfTaskState {
    pub fn new() -> Self {
        Self {
            tx_credit: TxCredit::new(),
            rx_random: RxRandom::new(0xC0FF_EE42),
            relay_queue: RelayQueue::new(),
            rssi_lowpass: RssiLowPass::default(),
            rx_channel: 0,
            rx_unix_time: 0,
            curr_pos_packet: None,
            region: Region::EuropeAfrica,
            pkt_count_bins: [0; 64],
            rx_idle_seconds: 0,
            gps_stale_seconds: 0,
        }
    }

    /// Trailing 64-second packet count.
    pub fn pkt_count_64(&self) -> u32 {
        self.pkt_count_bins.iter().sum()
    }

    fn record_packet(&mut self, unix_time: u32) {
        self.pkt_count_bins[(unix_time % 64) as usize] += 1;
    }

    /// Zero the bin that's about to roll 64 seconds stale, ahead of
    /// recording this second's count into it.
    fn roll_pkt_count_bin(&mut self, unix_time: u32) {
        self.pkt_count_bins[(unix_time % 64) as usize] = 0;
    }
}

impl Default for RfTaskState {
    fn default() -> Self {
        Self::new()
    }
}

/// The RF task: owns the transceiver and drives the per-second cycle.
/// `GpsSource` and `Parameters` are narrow, shared, read-only collaborators,
/// so they're held behind `Arc` rather than owned outright.
pub struct RfTask {
    transceiver: Box<dyn TransceiverFacade>,
    gps: Arc<dyn GpsSource>,
    params: Arc<dyn Parameters>,
    telemetry: TelemetryHub,
    state: RfTaskState,
}

impl RfTask {
    pub fn new(
        transceiver: Box<dyn TransceiverFacade>,
        gps: Arc<dyn GpsSource>,
        params: Arc<dyn Parameters>,
        telemetry: TelemetryHub,
    ) -> Self {
        let mut state = RfTaskState::new();
        state.region = params.region();
        Self {
            transceiver,
            gps,
            params,
            telemetry,
            state,
        }
    }

    pub fn state(&self) -> &RfTaskState {
        &self.state
    }

    /// Bring up the chip.
    pub async fn bring_up(&mut self) -> Result<u8, RfError> {
        bringup::bring_up(self.transceiver.as_mut(), &SYNC_WORD).await
    }

    /// Differential fields from two GPS fixes two seconds apart:
    /// latitude/longitude/altitude deltas over the fixed 2-second reference
    /// window. The sub-second-latency interaction between the reference fix
    /// and the current one is left unspecified; this crate does not guess
    /// at a correction.
    fn build_packet(&self, current: Position, reference: Position, time_of_second: u8) -> Packet {
        let dlat_deg = (current.latitude - reference.latitude) as f64
            / crate::packet::LAT_COUNTS_PER_DEGREE;
        let dlon_deg = (current.longitude - reference.longitude) as f64
            / crate::packet::LON_COUNTS_PER_DEGREE;
        const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
        let north_m = dlat_deg * METERS_PER_DEGREE_LAT;
        let east_m = dlon_deg * METERS_PER_DEGREE_LAT * reference.reference_cosine();
        let horizontal_m_per_2s = (north_m * north_m + east_m * east_m).sqrt();
        let speed = (horizontal_m_per_2s / 2.0).round().clamp(0.0, 255.0) as u8;
        let climb_dam_per_2s =
            current.altitude_dam as i32 - reference.altitude_dam as i32;
        let climb = (climb_dam_per_2s / 2).clamp(-128, 127) as i8;

        let mut flags = PacketFlags::empty();
        if self.params.stealth() {
            flags |= PacketFlags::STEALTH;
        }

        Packet {
            address: self.params.address(),
            addr_type: self.params.addr_type(),
            flags,
            relay_count: 0,
            time_of_second,
            latitude: current.latitude,
            longitude: current.longitude,
            altitude_dam: current.altitude_dam,
            speed,
            climb,
            turn: 0,
            accel: 0,
            aircraft_type: self.params.aircraft_type(),
        }
    }

    /// Step 1 of the per-second cycle: rebuild `CurrPosPacket`
    /// from the freshest fix, or mark a stale Ready packet once GPS lock has
    /// been absent for more than `GPS_LOCK_STALE_SECS`.
    async fn compose_own_packet(&mut self, time_of_second: u8) {
        let current = self.gps.position(0).await;
        let reference = self.gps.position(2).await;

        if let (Some(cur), Some(refpos)) = (current, reference) {
            if cur.is_valid() && refpos.is_valid() {
                self.state.curr_pos_packet =
                    Some(self.build_packet(cur, refpos, time_of_second));
                self.state.gps_stale_seconds = 0;
                return;
            }
        }

        self.state.gps_stale_seconds = self.gps.seconds_since_lock().await;
        if self.state.gps_stale_seconds > GPS_LOCK_STALE_SECS {
            if let Some(packet) = self.state.curr_pos_packet.as_mut() {
                packet.mark_stale();
            }
        }
    }

    /// Drain whatever frame the transceiver has queued, validate it through
    /// FEC, and fold it into the relay queue + telemetry.
    async fn process_received_frame(&mut self, frame: [u8; PACKET_LEN], rssi: u8, now: u8) -> Result<bool, RfError> {
        let mut working = frame;
        let violations = Packet::fec_check(&working);
        let rx_err;

        if violations == 0 {
            rx_err = 0;
        } else {
            let err_mask = [0u8; PACKET_LEN];
            let mut decoder = LdpcDecoder::new();
            decoder.input(&working, &err_mask);
            let remaining = decoder.decode();
            decoder.output(&mut working);
            rx_err = crate::util::popcount_bytes(&working.iter().zip(frame.iter()).map(|(a, b)| a ^ b).collect::<Vec<_>>()) as u8;
            if remaining != 0 || rx_err >= crate::constants::MAX_RX_ERR {
                return Ok(false);
            }
        }

        let mut payload = [0u8; 20];
        payload.copy_from_slice(&working[..20]);
        let packet = Packet::from_whitened_payload(&payload);

        let rx = RxPacket {
            packet,
            rssi,
            rx_err,
            rank: 0,
            slot_time: now,
            ready: true,
        };

        self.state.record_packet(self.state.rx_unix_time);
        self.state.rx_idle_seconds = 0;

        let is_own = packet.address == self.params.address() && packet.addr_type == self.params.addr_type();

        self.telemetry.own_packet(&packet).await;

        if packet.is_other() || packet.is_encrypted() || is_own {
            return Ok(true);
        }

        if let Some(refpos) = self.gps.position(0).await {
            if refpos.is_valid() {
                let (north_m, east_m) = packet.distance_vector_m(
                    refpos.latitude,
                    refpos.longitude,
                    refpos.reference_cosine(),
                );
                let alt_diff_m = packet.altitude_m() - (refpos.altitude_dam as i32 * 10);
                self.telemetry.relay_geometry(&packet, north_m, east_m, alt_diff_m).await;
            }
        }

        self.state.relay_queue.add_new(rx, now);
        Ok(true)
    }

    /// Pull a relay candidate from the queue for this half-slot, if the
    /// relay-gate parity and coin-flip both allow it.
    fn pick_relay_payload(&mut self, unix_time: u32, half_slot: HalfSlot) -> Option<[u8; PACKET_LEN]> {
        let relay_slot = if unix_time % 2 == 1 { HalfSlot::A } else { HalfSlot::B };
        if half_slot != relay_slot {
            return None;
        }
        let coin = self.state.rx_random.next_u8() & 1;
        if coin != 0 {
            return None;
        }

        let seed = self.state.rx_random.state();
        let idx = self.state.relay_queue.get_rand(seed)?;
        let mut packet = self.state.relay_queue.get(idx)?.rx.packet;
        packet.relay_count = packet.relay_count.saturating_add(1);
        let frame = packet.to_frame();
        self.state.relay_queue.decr_rank(idx);
        Some(frame)
    }

    /// One half-slot of the per-second cycle.
    async fn run_half_slot(&mut self, unix_time: u32, half_slot: HalfSlot) -> Result<(), RfError> {
        let channel = freq_plan::channel(unix_time, half_slot, self.state.region);
        self.transceiver.write_mode(crate::transceiver::ChipMode::Standby).await?;
        self.transceiver.set_channel(channel).await?;
        self.state.rx_channel = channel;

        if self.state.rx_idle_seconds >= RX_DROUGHT_SECS {
            log::warn!("{RX_DROUGHT_SECS}s receive drought, re-running bring-up");
            self.bring_up().await?;
            self.state.rx_idle_seconds = 0;
        }

        let now_sec = (unix_time % 60) as u8;
        self.transceiver.trigger_temp().await?;
        let chip_temp_c = self.transceiver.read_temp().await?;
        let avg_rssi_half_dbm = -(self.state.rssi_lowpass.output() as i16);
        self.telemetry
            .receiver_status(
                self.state.region as u8,
                self.state.pkt_count_64(),
                avg_rssi_half_dbm,
                chip_temp_c,
                self.state.tx_credit.value(),
            )
            .await;

        self.transceiver.write_mode(crate::transceiver::ChipMode::Rx).await?;

        let relay_payload = self.pick_relay_payload(unix_time, half_slot);
        let own_frame = self.state.curr_pos_packet.map(|p| p.to_frame());
        let payload = relay_payload.or(own_frame);

        self.state.tx_credit.increment();

        let mut buf = [0u8; PACKET_LEN];
        let n = self.transceiver.read_packet(&mut buf).await?;
        if n == PACKET_LEN {
            let rssi = self.transceiver.read_rssi().await?;
            self.process_received_frame(buf, rssi, now_sec).await?;
        } else {
            self.state.rx_idle_seconds += 1;
        }

        time_slot(
            self.transceiver.as_mut(),
            &mut self.state,
            TimeSlotParams {
                tx_channel: channel,
                slot_length_ms: TX_SLOT_MS,
                payload,
                noise_threshold: NOISE_THRESHOLD,
                max_wait_ms: LBT_MAX_WAIT_MS,
                desired_tx_time_ms: 0,
            },
        )
        .await?;

        self.transceiver.write_mode(crate::transceiver::ChipMode::Rx).await?;
        let remaining_ms = HALF_SLOT_MS.saturating_sub(TX_SLOT_MS);
        for _ in 0..remaining_ms {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        Ok(())
    }

    /// One full UTC second of the RF task's cycle.
    pub async fn run_one_second(&mut self, unix_time: u32) -> Result<(), RfError> {
        let now_sec = (unix_time % 60) as u8;
        self.state.roll_pkt_count_bin(unix_time);
        self.compose_own_packet(now_sec).await;
        self.state.rx_random.xor_shift();
        self.state.relay_queue.clean_time(now_sec);
        self.state.rx_unix_time = unix_time;

        self.run_half_slot(unix_time, HalfSlot::A).await?;
        self.run_half_slot(unix_time, HalfSlot::B).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticParameters;
    use crate::gps::MockGpsSource;
    use crate::telemetry::RingSink;
    use crate::transceiver::SimulatedTransceiver;

    fn make_task() -> RfTask {
        let transceiver = Box::new(SimulatedTransceiver::new());
        let gps = Arc::new(MockGpsSource::new());
        let params = Arc::new(StaticParameters::default());
        let telemetry = TelemetryHub::new(vec![Box::new(RingSink::new(16))]);
        RfTask::new(transceiver, gps, params, telemetry)
    }

    #[tokio::test(start_paused = true)]
    async fn bring_up_then_one_second_with_no_gps_emits_no_transmit() {
        let mut task = make_task();
        task.bring_up().await.unwrap();
        task.run_one_second(1_700_000_000).await.unwrap();
        assert!(task.state().curr_pos_packet.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn valid_gps_fix_produces_a_ready_packet() {
        let mut task = make_task();
        task.bring_up().await.unwrap();

        let gps = Arc::new(MockGpsSource::new());
        let fix = Position {
            latitude: 4_000_000,
            longitude: -2_000_000,
            altitude_dam: 100,
            complete: true,
            valid: true,
        };
        gps.push(fix).await;
        gps.push(fix).await;
        gps.push(fix).await;
        task.gps = gps;

        task.run_one_second(1_700_000_001).await.unwrap();
        assert!(task.state().curr_pos_packet.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rx_drought_triggers_rebring_up() {
        let mut task = make_task();
        task.bring_up().await.unwrap();
        task.state.rx_idle_seconds = RX_DROUGHT_SECS;
        task.run_one_second(1_700_000_002).await.unwrap();
        assert_eq!(task.state().rx_idle_seconds, 0);
    }

    #[test]
    fn pkt_count_64_rolls_off_after_64_seconds() {
        let mut state = RfTaskState::new();
        state.record_packet(1_000);
        assert_eq!(state.pkt_count_64(), 1);
        state.roll_pkt_count_bin(1_000 + 64);
        assert_eq!(state.pkt_count_64(), 0);
    }
}
