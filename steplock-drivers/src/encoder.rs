//! Polled single-channel encoder
//!
//! Counts level transitions of one digital input by sampling it at a fixed
//! interval. This approximates interrupt-driven decoding without needing
//! interrupt support: the sample interval bounds the fastest level change
//! that can still be told apart.
//!
//! The encoder is split in two halves that share only a [`TickCounter`]:
//!
//! - [`EncoderSampler`] owns the pin and the last seen level. Its
//!   [`run`](EncoderSampler::run) loop is spawned once as a background task
//!   and is the only writer of the count.
//! - [`Encoder`] is a cheap handle implementing [`TickSource`] for whoever
//!   needs to reset or read the count (the lock).
//!
//! # Usage
//!
//! ```ignore
//! static TICKS: TickCounter = TickCounter::new();
//!
//! let sampler = EncoderSampler::new(input, Delay, &TICKS, &config.encoder)?;
//! let encoder = sampler.encoder();
//! spawner.spawn(encoder_task(sampler))?;
//!
//! encoder.reset();
//! // ... move ...
//! let ticks = encoder.read();
//! ```

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use portable_atomic::{AtomicU32, Ordering};

use steplock_core::config::EncoderConfig;
use steplock_core::traits::{EncoderError, TickSource};

/// Tick count shared between the sampler task and its readers
///
/// Atomic so that the same guarantees hold on a preemptive or
/// multi-core executor: a reset is visible to every later read on the
/// resetting task, and increments from the sampler are never torn.
#[derive(Debug, Default)]
pub struct TickCounter {
    count: AtomicU32,
}

impl TickCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one level transition
    fn record(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }
}

impl TickSource for TickCounter {
    fn reset(&self) {
        self.count.store(0, Ordering::Release);
    }

    fn read(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

/// Reset/read handle to a running encoder
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    counter: &'a TickCounter,
}

impl<'a> Encoder<'a> {
    /// Create a handle to an existing counter
    pub fn new(counter: &'a TickCounter) -> Self {
        Self { counter }
    }
}

impl TickSource for Encoder<'_> {
    fn reset(&self) {
        self.counter.reset()
    }

    fn read(&self) -> u32 {
        self.counter.read()
    }
}

/// Background sampling half of the encoder
pub struct EncoderSampler<'a, P, D> {
    pin: P,
    delay: D,
    counter: &'a TickCounter,
    /// Last observed pin level
    prev_level: bool,
    interval_us: u32,
}

impl<'a, P: InputPin, D: DelayNs> EncoderSampler<'a, P, D> {
    /// Create a sampler for `pin`, counting into `counter`
    ///
    /// The current pin level becomes the reference for the first edge, so
    /// a pin that is already high does not count as a transition.
    pub fn new(
        mut pin: P,
        delay: D,
        counter: &'a TickCounter,
        config: &EncoderConfig,
    ) -> Result<Self, EncoderError> {
        if config.sample_interval_us == 0 {
            return Err(EncoderError::InvalidConfig);
        }

        let prev_level = pin.is_high().map_err(|_| EncoderError::InputPin)?;

        Ok(Self {
            pin,
            delay,
            counter,
            prev_level,
            interval_us: config.sample_interval_us,
        })
    }

    /// Get a reset/read handle sharing this sampler's counter
    pub fn encoder(&self) -> Encoder<'a> {
        Encoder::new(self.counter)
    }

    /// Sample the pin once
    ///
    /// Returns true if the level changed since the previous sample (and
    /// the count was incremented).
    pub fn sample(&mut self) -> Result<bool, EncoderError> {
        let level = self.pin.is_high().map_err(|_| EncoderError::InputPin)?;

        if level == self.prev_level {
            return Ok(false);
        }

        self.prev_level = level;
        self.counter.record();
        Ok(true)
    }

    /// Sample forever at the configured interval
    ///
    /// Yields to the executor between samples. Only returns if the input
    /// pin fails.
    pub async fn run(mut self) -> Result<Infallible, EncoderError> {
        loop {
            self.sample()?;
            self.delay.delay_us(self.interval_us).await;
        }
    }
}
