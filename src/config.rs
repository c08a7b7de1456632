//! Configuration boundary standing in for the device's parameters-in-flash
//! store.
//!
//! This crate never persists parameters; `Parameters` is a read-only trait
//! the RF task pulls from once at bring-up and, for a couple of fields,
//! rechecks each cycle. [`StaticParameters`] is a `serde`-deserializable
//! implementation for tests and simulation, JSON/TOML-configurable the same
//! way the radio chip's own configuration structs are.

use crate::constants::Region;
use serde::{Deserialize, Serialize};

/// Read-only accessors for the device's persisted configuration.
pub trait Parameters: Send + Sync {
    fn address(&self) -> u32;
    fn addr_type(&self) -> u8;
    fn tx_power_dbm(&self) -> i8;
    /// `true` selects hardware-controlled TX power ramping over a fixed
    /// register write.
    fn is_tx_type_hw(&self) -> bool;
    fn stealth(&self) -> bool;
    fn aircraft_type(&self) -> u8;
    /// Crystal frequency correction, in ppm, applied at bring-up.
    fn chip_freq_correction_ppm(&self) -> i16;
    fn region(&self) -> Region;
}

/// A plain, `serde`-deserializable set of parameters for tests, simulation,
/// and any deployment that reads configuration from a JSON/TOML file rather
/// than a live flash-backed store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticParameters {
    pub address: u32,
    pub addr_type: u8,
    pub tx_power_dbm: i8,
    pub tx_type_hw: bool,
    pub stealth: bool,
    pub aircraft_type: u8,
    pub chip_freq_correction_ppm: i16,
    pub region: Region,
}

impl Default for StaticParameters {
    fn default() -> Self {
        Self {
            address: 0x000001,
            addr_type: 1,
            tx_power_dbm: 14,
            tx_type_hw: true,
            stealth: false,
            aircraft_type: 1,
            chip_freq_correction_ppm: 0,
            region: Region::EuropeAfrica,
        }
    }
}

impl Parameters for StaticParameters {
    fn address(&self) -> u32 {
        self.address
    }

    fn addr_type(&self) -> u8 {
        self.addr_type
    }

    fn tx_power_dbm(&self) -> i8 {
        self.tx_power_dbm
    }

    fn is_tx_type_hw(&self) -> bool {
        self.tx_type_hw
    }

    fn stealth(&self) -> bool {
        self.stealth
    }

    fn aircraft_type(&self) -> u8 {
        self.aircraft_type
    }

    fn chip_freq_correction_ppm(&self) -> i16 {
        self.chip_freq_correction_ppm
    }

    fn region(&self) -> Region {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_are_internally_consistent() {
        let p = StaticParameters::default();
        assert_eq!(p.region(), Region::EuropeAfrica);
        assert!(p.is_tx_type_hw());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "address": 11259375,
            "addr_type": 2,
            "tx_power_dbm": 10,
            "tx_type_hw": false,
            "stealth": true,
            "aircraft_type": 8,
            "chip_freq_correction_ppm": -12,
            "region": "UsaCanada"
        }"#;
        let p: StaticParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.address, 0xABCDEF);
        assert_eq!(p.region(), Region::UsaCanada);
        assert!(p.stealth());
    }
}
