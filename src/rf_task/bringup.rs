//! Chip bring-up.

use crate::error::RfError;
use crate::transceiver::{ChipMode, TransceiverFacade};
use std::time::Duration;
use tokio::time::sleep;

/// Reset the chip, program the sync word and channel 0, and confirm the
/// version byte is sane (not `0x00`/`0xFF`). Retries forever at 1 s
/// intervals — a dead/absent chip never surfaces as an error, it just
/// keeps retrying.
pub async fn bring_up(transceiver: &mut dyn TransceiverFacade, sync: &[u8]) -> Result<u8, RfError> {
    loop {
        transceiver.reset().await?;
        transceiver.write_mode(ChipMode::Standby).await?;
        sleep(Duration::from_millis(1)).await;
        transceiver.write_sync(sync).await?;
        transceiver.set_channel(0).await?;

        match transceiver.read_version().await {
            Ok(version) if version != 0x00 && version != 0xFF => {
                log::info!("transceiver bring-up complete, version 0x{version:02X}");
                return Ok(version);
            }
            Ok(version) => {
                log::warn!("transceiver absent or dead (version byte 0x{version:02X}), retrying");
            }
            Err(e) => {
                log::warn!("bring-up read_version failed: {e}, retrying");
            }
        }
        sleep(Duration::from_secs(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transceiver::SimulatedTransceiver;

    #[tokio::test]
    async fn bring_up_succeeds_immediately_on_a_healthy_chip() {
        let mut t = SimulatedTransceiver::new();
        let version = bring_up(&mut t, &[0x93, 0x43, 0x10]).await.unwrap();
        assert_eq!(version, 0x24);
        assert_eq!(t.channel, 0);
    }
}
