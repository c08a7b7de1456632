//! Telemetry Formatter: NMEA-style sentences describing
//! own-position transmissions, received-traffic geometry, and receiver
//! status, written to one or more [`sinks::TelemetrySink`]s.

pub mod sentences;
pub mod sinks;

pub use sentences::{verify_checksum, write_pflaa, write_pognr, write_pognt};
pub use sinks::{LogSink, RingSink, TelemetrySink};

use crate::packet::Packet;

/// Fans a formatted line out to every registered sink, logging (but not
/// propagating) any individual sink failure — a telemetry write error
/// never interrupts the per-second cycle.
pub struct TelemetryHub {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl TelemetryHub {
    pub fn new(sinks: Vec<Box<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    async fn broadcast(&self, line: &str) {
        for sink in &self.sinks {
            if let Err(e) = sink.write_line(line).await {
                log::warn!("telemetry sink dropped a line: {e}");
            }
        }
    }

    pub async fn own_packet(&self, packet: &Packet) {
        self.broadcast(&write_pognt(packet)).await;
    }

    pub async fn relay_geometry(&self, packet: &Packet, north_m: i32, east_m: i32, alt_diff_m: i32) {
        self.broadcast(&write_pflaa(packet, north_m, east_m, alt_diff_m))
            .await;
    }

    pub async fn receiver_status(
        &self,
        plan: u8,
        pkt_count_64: u32,
        avg_rssi_half_dbm: i16,
        chip_temp_c: i8,
        tx_credit: u8,
    ) {
        self.broadcast(&write_pognr(plan, pkt_count_64, avg_rssi_half_dbm, chip_temp_c, tx_credit))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketFlags;

    #[tokio::test]
    async fn hub_with_no_sinks_is_a_no_op() {
        let hub = TelemetryHub::new(vec![]);
        let packet = Packet {
            address: 1,
            addr_type: 1,
            flags: PacketFlags::empty(),
            relay_count: 0,
            time_of_second: 0,
            latitude: 0,
            longitude: 0,
            altitude_dam: 0,
            speed: 0,
            climb: 0,
            turn: 0,
            accel: 0,
            aircraft_type: 1,
        };
        hub.own_packet(&packet).await;
    }

    #[tokio::test]
    async fn hub_broadcasts_to_a_log_sink_without_error() {
        let hub = TelemetryHub::new(vec![Box::new(LogSink)]);
        hub.receiver_status(2, 10, -90, 22, 3).await;
    }
}
