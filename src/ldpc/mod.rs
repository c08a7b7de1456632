//! LDPC-based forward error correction for the OGN (208,160) code
//!.

pub mod tables;

use crate::constants::{LDPC_MAX_ITERATIONS, PACKET_LEN};
use tables::{DATA_BITS, GRAPH, PARITY_BITS, TOTAL_BITS};

fn get_bit(bytes: &[u8], index: usize) -> bool {
    let byte = bytes[index / 8];
    (byte >> (7 - (index % 8))) & 1 != 0
}

fn set_bit(bytes: &mut [u8], index: usize, value: bool) {
    let mask = 1u8 << (7 - (index % 8));
    if value {
        bytes[index / 8] |= mask;
    } else {
        bytes[index / 8] &= !mask;
    }
}

/// Compute the 48 parity bits (6 bytes) for a 20-byte whitened payload.
pub fn compute_fec(payload: &[u8; 20]) -> [u8; 6] {
    let mut parity = [0u8; 6];
    for (check, data_bits) in GRAPH.check_data_bits.iter().enumerate() {
        let mut acc = false;
        for &bit in data_bits {
            acc ^= get_bit(payload, bit);
        }
        set_bit(&mut parity, check, acc);
    }
    parity
}

/// Number of parity checks violated by a full 26-byte frame (payload ‖
/// parity). Zero means the frame is internally consistent.
pub fn check(frame: &[u8; PACKET_LEN]) -> u32 {
    let mut violations = 0;
    for check in 0..PARITY_BITS {
        if check_violated(frame, check) {
            violations += 1;
        }
    }
    violations
}

fn bit_of_frame(frame: &[u8; PACKET_LEN], bit: usize) -> bool {
    if bit < DATA_BITS {
        get_bit(&frame[..20], bit)
    } else {
        get_bit(&frame[20..], bit - DATA_BITS)
    }
}

fn set_bit_of_frame(frame: &mut [u8; PACKET_LEN], bit: usize, value: bool) {
    if bit < DATA_BITS {
        let (payload, _) = frame.split_at_mut(20);
        set_bit(payload, bit, value);
    } else {
        let (_, parity) = frame.split_at_mut(20);
        set_bit(parity, bit - DATA_BITS, value);
    }
}

fn check_violated(frame: &[u8; PACKET_LEN], check: usize) -> bool {
    let mut acc = false;
    for &bit in &GRAPH.check_data_bits[check] {
        acc ^= bit_of_frame(frame, bit);
    }
    acc ^= bit_of_frame(frame, DATA_BITS + check);
    acc
}

/// Iterative bit-flip decoder over Manchester-demodulated pairs. Stateful but not reentrant: one `Input` per decode attempt.
pub struct LdpcDecoder {
    bits: [bool; TOTAL_BITS],
    uncertain: [bool; TOTAL_BITS],
}

impl LdpcDecoder {
    pub fn new() -> Self {
        Self {
            bits: [false; TOTAL_BITS],
            uncertain: [false; TOTAL_BITS],
        }
    }

    /// Load hard decisions and per-bit "Manchester-uncertain" flags from a
    /// 26-byte frame and its 26-byte error mask (one bit set per uncertain
    /// demodulated bit).
    pub fn input(&mut self, frame: &[u8; PACKET_LEN], err_mask: &[u8; PACKET_LEN]) {
        for bit in 0..TOTAL_BITS {
            self.bits[bit] = bit_of_frame(frame, bit);
            self.uncertain[bit] = bit_of_frame(err_mask, bit);
        }
    }

    /// Run one parity-sweep iteration: compute the syndrome, and if it's
    /// non-zero, flip the single most-implicated bit (biased toward bits
    /// already flagged Manchester-uncertain). Returns the violation count
    /// observed *before* any flip this round.
    pub fn process_checks(&mut self) -> u32 {
        let mut syndrome = [false; PARITY_BITS];
        let mut violations = 0u32;
        for check in 0..PARITY_BITS {
            let mut acc = false;
            for &bit in &GRAPH.check_data_bits[check] {
                acc ^= self.bits[bit];
            }
            acc ^= self.bits[DATA_BITS + check];
            syndrome[check] = acc;
            if acc {
                violations += 1;
            }
        }

        if violations == 0 {
            return 0;
        }

        let mut best_bit = None;
        let mut best_score = -1i32;
        for bit in 0..TOTAL_BITS {
            let mut score = 0i32;
            for &c in &GRAPH.bit_checks[bit] {
                if syndrome[c] {
                    score += 1;
                }
            }
            if score == 0 {
                continue;
            }
            if self.uncertain[bit] {
                score += 1;
            }
            if score > best_score {
                best_score = score;
                best_bit = Some(bit);
            }
        }

        if let Some(bit) = best_bit {
            self.bits[bit] = !self.bits[bit];
        }

        violations
    }

    /// Run up to `LDPC_MAX_ITERATIONS` rounds, stopping early on a clean
    /// syndrome. Returns the final violation count.
    pub fn decode(&mut self) -> u32 {
        let mut violations = self.process_checks();
        let mut iterations = 1;
        while violations > 0 && iterations < LDPC_MAX_ITERATIONS {
            violations = self.process_checks();
            iterations += 1;
        }
        violations
    }

    /// Write the corrected 26-byte frame back out.
    pub fn output(&self, frame: &mut [u8; PACKET_LEN]) {
        *frame = [0u8; PACKET_LEN];
        for bit in 0..TOTAL_BITS {
            if self.bits[bit] {
                set_bit_of_frame(frame, bit, true);
            }
        }
    }
}

impl Default for LdpcDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> [u8; 20] {
        let mut p = [0u8; 20];
        for (i, b) in p.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        p
    }

    #[test]
    fn clean_frame_has_zero_violations() {
        let payload = sample_payload();
        let parity = compute_fec(&payload);
        let mut frame = [0u8; PACKET_LEN];
        frame[..20].copy_from_slice(&payload);
        frame[20..].copy_from_slice(&parity);
        assert_eq!(check(&frame), 0);
    }

    #[test]
    fn single_bit_corruption_is_detected() {
        let payload = sample_payload();
        let parity = compute_fec(&payload);
        let mut frame = [0u8; PACKET_LEN];
        frame[..20].copy_from_slice(&payload);
        frame[20..].copy_from_slice(&parity);
        frame[3] ^= 0x01;
        assert!(check(&frame) > 0);
    }

    #[test]
    fn decoder_corrects_two_flipped_bits() {
        let payload = sample_payload();
        let parity = compute_fec(&payload);
        let mut frame = [0u8; PACKET_LEN];
        frame[..20].copy_from_slice(&payload);
        frame[20..].copy_from_slice(&parity);

        let mut corrupted = frame;
        corrupted[1] ^= 0x04;
        corrupted[9] ^= 0x40;

        let err_mask = [0u8; PACKET_LEN];
        let mut decoder = LdpcDecoder::new();
        decoder.input(&corrupted, &err_mask);
        let violations = decoder.decode();
        assert_eq!(violations, 0);

        let mut out = [0u8; PACKET_LEN];
        decoder.output(&mut out);
        assert_eq!(out, frame);
    }

    #[test]
    fn uncertain_flags_bias_correction_toward_flagged_bits() {
        let payload = sample_payload();
        let parity = compute_fec(&payload);
        let mut frame = [0u8; PACKET_LEN];
        frame[..20].copy_from_slice(&payload);
        frame[20..].copy_from_slice(&parity);

        let mut corrupted = frame;
        corrupted[5] ^= 0x10;

        let mut err_mask = [0u8; PACKET_LEN];
        err_mask[5] = 0x10;

        let mut decoder = LdpcDecoder::new();
        decoder.input(&corrupted, &err_mask);
        let violations = decoder.decode();
        assert_eq!(violations, 0);
    }
}
