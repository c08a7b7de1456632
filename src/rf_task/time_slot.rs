//! The `TimeSlot` algorithm: listen a half-slot window,
//! optionally attempt one listen-before-talk transmit at a randomized
//! offset, then keep listening to the slot boundary.

use crate::constants::PACKET_LEN;
use crate::rf_task::RfTaskState;
use crate::transceiver::{ChipMode, TransceiverFacade};
use std::time::Duration;
use tokio::time::sleep;

/// One tick of the cooperative listen loop.
const TICK: Duration = Duration::from_millis(1);

/// Maximum polling iterations waiting for `PacketSent`, each one tick —
///  "poll mode/IRQ up to ~200 ms for PacketSent".
const PACKET_SENT_POLL_ITERATIONS: u32 = 200;

pub struct TimeSlotParams {
    pub tx_channel: u8,
    pub slot_length_ms: u32,
    pub payload: Option<[u8; PACKET_LEN]>,
    pub noise_threshold: u8,
    pub max_wait_ms: u32,
    pub desired_tx_time_ms: u32,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TimeSlotOutcome {
    pub transmitted: bool,
    /// `true` if a transmit was attempted but aborted by listen-before-talk.
    pub lbt_aborted: bool,
}

/// Listen one RSSI sample and mix it into both the lowpass tracker and
/// `RX_Random`.
async fn sample_rssi(
    transceiver: &mut dyn TransceiverFacade,
    state: &mut RfTaskState,
) -> Result<u8, crate::error::RfError> {
    transceiver.trigger_rssi().await?;
    let rssi = transceiver.read_rssi().await?;
    state.rssi_lowpass.update(rssi);
    state.rx_random.mix_rssi(rssi);
    Ok(rssi)
}

/// Run one half-slot: listen, optionally transmit once, keep listening.
pub async fn time_slot(
    transceiver: &mut dyn TransceiverFacade,
    state: &mut RfTaskState,
    params: TimeSlotParams,
) -> Result<TimeSlotOutcome, crate::error::RfError> {
    let mut outcome = TimeSlotOutcome::default();

    let max_tx_time = params
        .slot_length_ms
        .saturating_sub(10)
        .saturating_sub(params.max_wait_ms);
    let desired_tx_time = if params.desired_tx_time_ms == 0 || params.desired_tx_time_ms >= max_tx_time {
        if max_tx_time == 0 {
            0
        } else {
            state.rx_random.next_below(max_tx_time)
        }
    } else {
        params.desired_tx_time_ms
    };

    let mut elapsed_ms = 0u32;
    while elapsed_ms < desired_tx_time {
        sample_rssi(transceiver, state).await?;
        sleep(TICK).await;
        elapsed_ms += 1;
    }

    if let Some(payload) = params.payload {
        if state.tx_credit.has_credit() {
            let mut busy = false;
            for _ in 0..params.max_wait_ms {
                let rssi = sample_rssi(transceiver, state).await?;
                if rssi > params.noise_threshold {
                    busy = true;
                    break;
                }
                sleep(TICK).await;
                elapsed_ms += 1;
            }

            if busy {
                outcome.lbt_aborted = true;
            } else {
                transceiver.write_mode(ChipMode::Standby).await?;
                transceiver.set_channel(params.tx_channel).await?;
                transceiver.clear_irq_flags().await?;
                transceiver.write_packet(&payload).await?;
                transceiver.write_mode(ChipMode::Tx).await?;

                let mut sent = false;
                for _ in 0..PACKET_SENT_POLL_ITERATIONS {
                    let flags = transceiver.read_irq_flags().await?;
                    if flags.contains(crate::transceiver::IrqFlags::PACKET_SENT) {
                        sent = true;
                        break;
                    }
                    sleep(TICK).await;
                    elapsed_ms += 1;
                }

                transceiver.write_mode(ChipMode::Standby).await?;
                transceiver.write_mode(ChipMode::Rx).await?;

                if sent {
                    state.tx_credit.try_spend();
                    outcome.transmitted = true;
                }
            }
        }
    }

    while elapsed_ms < params.slot_length_ms {
        sample_rssi(transceiver, state).await?;
        sleep(TICK).await;
        elapsed_ms += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rf_task::RfTaskState;
    use crate::transceiver::SimulatedTransceiver;

    #[tokio::test(start_paused = true)]
    async fn listen_only_slot_never_transmits() {
        let mut t = SimulatedTransceiver::new();
        let mut state = RfTaskState::new();
        let outcome = time_slot(
            &mut t,
            &mut state,
            TimeSlotParams {
                tx_channel: 0,
                slot_length_ms: 20,
                payload: None,
                noise_threshold: 200,
                max_wait_ms: 8,
                desired_tx_time_ms: 5,
            },
        )
        .await
        .unwrap();
        assert!(!outcome.transmitted);
        assert!(t.last_tx_frame.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_channel_transmits_and_spends_one_credit() {
        let mut t = SimulatedTransceiver::new();
        t.rssi = 0; // well under any reasonable noise threshold
        let mut state = RfTaskState::new();
        state.tx_credit.increment();
        let payload = [0u8; PACKET_LEN];
        let outcome = time_slot(
            &mut t,
            &mut state,
            TimeSlotParams {
                tx_channel: 3,
                slot_length_ms: 20,
                payload: Some(payload),
                noise_threshold: 100,
                max_wait_ms: 4,
                desired_tx_time_ms: 2,
            },
        )
        .await
        .unwrap();
        assert!(outcome.transmitted);
        assert!(!outcome.lbt_aborted);
        assert_eq!(t.last_tx_frame, Some(payload.to_vec()));
        assert_eq!(state.tx_credit.value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_channel_aborts_without_spending_credit() {
        let mut t = SimulatedTransceiver::new();
        t.rssi = 255; // always "busy"
        let mut state = RfTaskState::new();
        state.tx_credit.increment();
        let payload = [0u8; PACKET_LEN];
        let outcome = time_slot(
            &mut t,
            &mut state,
            TimeSlotParams {
                tx_channel: 3,
                slot_length_ms: 20,
                payload: Some(payload),
                noise_threshold: 10,
                max_wait_ms: 4,
                desired_tx_time_ms: 2,
            },
        )
        .await
        .unwrap();
        assert!(!outcome.transmitted);
        assert!(outcome.lbt_aborted);
        assert_eq!(state.tx_credit.value(), 1);
    }
}
