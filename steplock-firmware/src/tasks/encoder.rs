//! Encoder sampling task

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Delay;

use steplock_drivers::EncoderSampler;

/// Sampler type for the on-board encoder input
pub type Sampler = EncoderSampler<'static, Input<'static>, Delay>;

/// Encoder task - polls the encoder input forever
///
/// A failing input would make every later verification meaningless, so
/// the task halts the firmware instead of returning.
#[embassy_executor::task]
pub async fn encoder_task(sampler: Sampler) {
    info!("Encoder task started");

    match sampler.run().await {
        Ok(never) => match never {},
        Err(e) => {
            error!("Encoder input failed: {:?}", e);
            defmt::panic!("encoder sampling stopped");
        }
    }
}
