//! Fixed-capacity relay priority queue.
//!
//! Holds up to `RELAY_QUEUE_CAPACITY` recently heard foreign packets, ranked
//! by how useful relaying each one is (weaker signal / fewer prior relays
//! score higher), so the half-slot relay decision can cheaply pick the best
//! candidate without rescanning every received packet.

use crate::constants::{RELAY_ENTRY_LIFETIME_SECS, RELAY_QUEUE_CAPACITY};
use crate::packet::RxPacket;

#[derive(Debug, Clone, Copy)]
pub struct RelayEntry {
    pub rx: RxPacket,
    pub rank: i16,
    /// Slot-time (seconds-within-minute) this entry was last (re)admitted.
    pub time: u8,
}

/// Priority-ranked, fixed-capacity queue of relay candidates.
///
/// `sum` is a running count of entries with `rank > 0`, kept in sync by every
/// mutating method rather than recomputed lazily.
#[derive(Debug)]
pub struct RelayQueue {
    entries: [Option<RelayEntry>; RELAY_QUEUE_CAPACITY],
    sum: i16,
}

/// Priority score for a freshly heard packet: weaker RSSI and fewer prior
/// relay hops make a packet a more valuable relay candidate.
pub fn calc_relay_rank(rx: &RxPacket) -> i16 {
    let rssi_term = (255 - rx.rssi as i16) / 4;
    let hop_penalty = rx.packet.relay_count as i16 * 8;
    let err_penalty = rx.rx_err as i16 * 2;
    (rssi_term - hop_penalty - err_penalty).max(1)
}

impl RelayQueue {
    pub fn new() -> Self {
        Self {
            entries: [None; RELAY_QUEUE_CAPACITY],
            sum: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of entries with `rank > 0`.
    pub fn sum(&self) -> i16 {
        self.sum
    }

    fn find_slot(&self, address: u32, addr_type: u8) -> Option<usize> {
        self.entries.iter().position(|e| {
            e.map(|e| e.rx.packet.address == address && e.rx.packet.addr_type == addr_type)
                .unwrap_or(false)
        })
    }

    fn lowest_rank_slot(&self) -> Option<(usize, i16)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.map(|e| (i, e.rank)))
            .min_by_key(|&(_, rank)| rank)
    }

    fn set_slot(&mut self, idx: usize, entry: Option<RelayEntry>) {
        if let Some(old) = self.entries[idx] {
            if old.rank > 0 {
                self.sum -= 1;
            }
        }
        if let Some(new) = entry {
            if new.rank > 0 {
                self.sum += 1;
            }
        }
        self.entries[idx] = entry;
    }

    /// Admit (or refresh) a candidate. Packets from an `(address, addr_type)`
    /// already present replace that entry outright; otherwise the candidate takes an empty slot,
    /// or — when full — displaces the current lowest-rank entry if it ranks
    /// higher. Returns `true` if the candidate was admitted.
    pub fn add_new(&mut self, rx: RxPacket, now: u8) -> bool {
        let rank = calc_relay_rank(&rx);
        let entry = RelayEntry { rx, rank, time: now };

        if let Some(idx) = self.find_slot(rx.packet.address, rx.packet.addr_type) {
            self.set_slot(idx, Some(entry));
            return true;
        }

        if let Some(idx) = self.entries.iter().position(|e| e.is_none()) {
            self.set_slot(idx, Some(entry));
            return true;
        }

        if let Some((idx, lowest)) = self.lowest_rank_slot() {
            if rank > lowest {
                self.set_slot(idx, Some(entry));
                return true;
            }
        }
        false
    }

    /// The highest-rank entry currently queued, without removing it.
    pub fn get_new(&self) -> Option<&RelayEntry> {
        self.entries
            .iter()
            .filter_map(|e| e.as_ref())
            .max_by_key(|e| e.rank)
    }

    /// Entry at `idx`, if occupied.
    pub fn get(&self, idx: usize) -> Option<&RelayEntry> {
        self.entries.get(idx).and_then(|e| e.as_ref())
    }

    /// Pick the index of one entry with `rank > 0`, weighted toward higher
    /// ranks, using `seed` as the sole source of randomness.
    pub fn get_rand(&self, seed: u32) -> Option<usize> {
        let total: u32 = self
            .entries
            .iter()
            .filter_map(|e| e.as_ref())
            .filter(|e| e.rank > 0)
            .map(|e| e.rank as u32)
            .sum();
        if total == 0 {
            return None;
        }
        let mut pick = seed % total;
        for (idx, entry) in self.entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            if entry.rank <= 0 {
                continue;
            }
            let weight = entry.rank as u32;
            if pick < weight {
                return Some(idx);
            }
            pick -= weight;
        }
        None
    }

    /// Age the rank of the single entry at `idx` down by one, keeping `sum`
    /// in sync.
    pub fn decr_rank(&mut self, idx: usize) {
        if let Some(mut e) = self.entries[idx] {
            let was_positive = e.rank > 0;
            e.rank -= 1;
            if was_positive && e.rank <= 0 {
                self.sum -= 1;
            }
            self.entries[idx] = Some(e);
        }
    }

    /// Evict entries older than `RELAY_ENTRY_LIFETIME_SECS`, comparing
    /// modulo-60 slot-time stamps.
    pub fn clean_time(&mut self, now: u8) {
        for idx in 0..self.entries.len() {
            if let Some(e) = self.entries[idx] {
                let age = now.wrapping_sub(e.time) % 60;
                if age as u32 >= RELAY_ENTRY_LIFETIME_SECS as u32 {
                    self.set_slot(idx, None);
                }
            }
        }
    }

    /// Render the queue's current occupants, one line per entry, for the
    /// console telemetry sink.
    pub fn print(&self) -> String {
        let mut out = String::new();
        for (i, e) in self.entries.iter().enumerate() {
            if let Some(e) = e {
                out.push_str(&format!(
                    "{i}: addr={:06X} rank={} time={}\n",
                    e.rx.packet.address, e.rank, e.time
                ));
            }
        }
        out
    }
}

impl Default for RelayQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Packet, PacketFlags};

    fn rx(address: u32, rssi: u8, relay_count: u8) -> RxPacket {
        RxPacket {
            packet: Packet {
                address,
                addr_type: 1,
                flags: PacketFlags::empty(),
                relay_count,
                time_of_second: 10,
                latitude: 0,
                longitude: 0,
                altitude_dam: 0,
                speed: 0,
                climb: 0,
                turn: 0,
                accel: 0,
                aircraft_type: 1,
            },
            rssi,
            rx_err: 0,
            rank: 0,
            slot_time: 0,
            ready: true,
        }
    }

    #[test]
    fn sum_tracks_positive_rank_entries() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 100, 0), 0);
        q.add_new(rx(2, 200, 0), 0);
        assert_eq!(q.sum(), 2);
    }

    #[test]
    fn duplicate_address_replaces_in_place() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 200, 0), 0);
        assert_eq!(q.len(), 1);
        q.add_new(rx(1, 50, 0), 5);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get_new().unwrap().time, 5);
    }

    #[test]
    fn full_queue_displaces_lowest_rank_for_a_better_candidate() {
        let mut q = RelayQueue::new();
        for i in 0..RELAY_QUEUE_CAPACITY as u32 {
            q.add_new(rx(i + 1, 250, 5), 0); // low rank: strong signal, many hops
        }
        assert_eq!(q.len(), RELAY_QUEUE_CAPACITY);
        let admitted = q.add_new(rx(999, 0, 0), 0); // very high rank
        assert!(admitted);
        assert!(q.find_slot(999, 1).is_some());
    }

    #[test]
    fn full_queue_rejects_a_worse_candidate() {
        let mut q = RelayQueue::new();
        for i in 0..RELAY_QUEUE_CAPACITY as u32 {
            q.add_new(rx(i + 1, 0, 0), 0); // high rank already
        }
        let admitted = q.add_new(rx(999, 250, 10), 0); // clearly worse
        assert!(!admitted);
    }

    #[test]
    fn decr_rank_ages_out_to_zero_and_updates_sum() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 250, 5), 0); // small positive rank
        let rank = q.get_new().unwrap().rank;
        let idx = q.find_slot(1, 1).unwrap();
        for _ in 0..rank {
            q.decr_rank(idx);
        }
        assert_eq!(q.sum(), 0);
    }

    #[test]
    fn decr_rank_only_touches_the_given_entry() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 100, 0), 0);
        q.add_new(rx(2, 100, 0), 0);
        let idx1 = q.find_slot(1, 1).unwrap();
        let idx2 = q.find_slot(2, 1).unwrap();
        let rank1_before = q.get(idx1).unwrap().rank;
        let rank2_before = q.get(idx2).unwrap().rank;
        q.decr_rank(idx1);
        assert_eq!(q.get(idx1).unwrap().rank, rank1_before - 1);
        assert_eq!(q.get(idx2).unwrap().rank, rank2_before);
    }

    #[test]
    fn clean_time_evicts_stale_entries() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 100, 0), 0);
        q.clean_time(31);
        assert!(q.is_empty());
        assert_eq!(q.sum(), 0);
    }

    #[test]
    fn clean_time_keeps_fresh_entries() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 100, 0), 10);
        q.clean_time(20);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn get_rand_only_returns_positive_rank_entries() {
        let mut q = RelayQueue::new();
        q.add_new(rx(1, 100, 0), 0);
        for seed in 0..50 {
            let idx = q.get_rand(seed).expect("one candidate present");
            assert!(q.get(idx).unwrap().rank > 0);
        }
    }
}
