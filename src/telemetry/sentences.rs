//! NMEA-style telemetry sentence formatting.
//!
//! Every sentence is `$TAG,field,field,...*CC\r\n`, where `CC` is the
//! two-hex-digit XOR checksum of every byte between `$` and `*` — the
//! conventional NMEA-0183 checksum, computed here rather than guessed at
//! per sentence.

use crate::packet::Packet;

fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

fn wrap(tag: &str, fields: &str) -> String {
    let body = format!("{tag},{fields}");
    format!("${body}*{:02X}\r\n", checksum(&body))
}

/// `$POGNT`: own-packet telemetry, emitted once per successful TX.
pub fn write_pognt(packet: &Packet) -> String {
    wrap("POGNT", &packet.write_pognt_fields())
}

/// `$PFLAA`: relative-geometry sentence for a received foreign packet.
pub fn write_pflaa(packet: &Packet, north_m: i32, east_m: i32, alt_diff_m: i32) -> String {
    wrap("PFLAA", &packet.write_pflaa_fields(north_m, east_m, alt_diff_m))
}

/// `$POGNR`: periodic receiver status: frequency plan
/// (region code), trailing-64-second packet count, average RSSI in
/// -0.5 dBm units, chip temperature in Celsius, and current TX credit.
/// Two fields are left blank to match the canonical
/// `$POGNR,<plan>,<pktCount64>,,<avgRssi>,<chipTemp>,,<txCredit>*HH` layout.
pub fn write_pognr(plan: u8, pkt_count_64: u32, avg_rssi_half_dbm: i16, chip_temp_c: i8, tx_credit: u8) -> String {
    wrap(
        "POGNR",
        &format!("{plan},{pkt_count_64},,{avg_rssi_half_dbm},{chip_temp_c},,{tx_credit}"),
    )
}

/// Verify a received sentence's trailing checksum.
pub fn verify_checksum(sentence: &str) -> bool {
    let sentence = sentence.trim_end();
    let Some(star) = sentence.rfind('*') else {
        return false;
    };
    let Some(body) = sentence.strip_prefix('$') else {
        return false;
    };
    let body = &body[..star - 1];
    let Ok(claimed) = u8::from_str_radix(&sentence[star + 1..], 16) else {
        return false;
    };
    checksum(body) == claimed
}
