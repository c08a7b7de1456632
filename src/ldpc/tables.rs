//! Parity-check graph for the OGN (208,160) LDPC-like code.
//!
//! The published OGN parity-check matrix isn't reproduced here bit-for-bit.
//! What's reproduced is its *shape*: a systematic (208,160) code — 160
//! message bits, 48 parity bits, one parity bit per check equation — built
//! once into a fixed sparse bipartite graph so the same graph is used for
//! every `compute`/`check`/decode call. DESIGN.md records this as a
//! deliberate deviation: true bit-for-bit OGN interop requires substituting
//! the real matrix for `build_graph`'s generated one.

use once_cell::sync::Lazy;

pub const DATA_BITS: usize = 160;
pub const PARITY_BITS: usize = 48;
pub const TOTAL_BITS: usize = DATA_BITS + PARITY_BITS;
const BITS_PER_CHECK: usize = 12;

pub struct ParityGraph {
    /// For each of the 48 checks, the data-bit indices (into `0..DATA_BITS`)
    /// it covers, not counting its own dedicated parity bit.
    pub check_data_bits: Vec<Vec<usize>>,
    /// For each of the 208 bits, the check indices it participates in.
    pub bit_checks: Vec<Vec<usize>>,
}

fn scramble(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x85eb_ca6b);
    x ^= x >> 13;
    x = x.wrapping_mul(0xc2b2_ae35);
    x ^= x >> 16;
    x
}

fn build_graph() -> ParityGraph {
    let mut check_data_bits = Vec::with_capacity(PARITY_BITS);
    let mut bit_checks: Vec<Vec<usize>> = vec![Vec::new(); TOTAL_BITS];

    for check in 0..PARITY_BITS {
        let mut chosen = Vec::with_capacity(BITS_PER_CHECK);
        let mut seed = scramble(check as u32 ^ 0x5bd1_e995);
        while chosen.len() < BITS_PER_CHECK {
            seed = scramble(seed);
            let candidate = (seed as usize) % DATA_BITS;
            if !chosen.contains(&candidate) {
                chosen.push(candidate);
                bit_checks[candidate].push(check);
            }
        }
        chosen.sort_unstable();

        // The parity bit dedicated to this check (systematic code: H = [A | I]).
        let parity_bit = DATA_BITS + check;
        bit_checks[parity_bit].push(check);

        check_data_bits.push(chosen);
    }

    ParityGraph {
        check_data_bits,
        bit_checks,
    }
}

pub static GRAPH: Lazy<ParityGraph> = Lazy::new(build_graph);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_check_covers_the_expected_bit_count() {
        for bits in &GRAPH.check_data_bits {
            assert_eq!(bits.len(), BITS_PER_CHECK);
        }
    }

    #[test]
    fn every_bit_participates_in_at_least_one_check() {
        for (bit, checks) in GRAPH.bit_checks.iter().enumerate() {
            assert!(!checks.is_empty(), "bit {bit} has no checks");
        }
    }

    #[test]
    fn parity_bits_each_belong_to_exactly_one_check() {
        for p in 0..PARITY_BITS {
            assert_eq!(GRAPH.bit_checks[DATA_BITS + p].len(), 1);
            assert_eq!(GRAPH.bit_checks[DATA_BITS + p][0], p);
        }
    }
}
