//! STEP/DIR stepper driver
//!
//! Drives the common STEP/DIR/EN interface of A4988, DRV8825 and TMC2209
//! (standalone mode) driver boards with plain GPIO outputs:
//!
//! - EN gates the driver; deasserted (motor released) except during a move
//! - DIR is set once per move before the first step and held
//! - STEP is toggled once per half-step with a fixed delay in between
//!
//! The delay is awaited through `embedded-hal-async`'s `DelayNs`, so each
//! step is a suspension point where other tasks (the encoder sampler) run.
//! There is no ramping: every step uses the same delay.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;

use steplock_core::config::StepperConfig;
use steplock_core::traits::{Direction, StepperDriver, StepperError};

/// Placeholder enable output for boards with EN tied to its active level
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnablePin;

impl ErrorType for NoEnablePin {
    type Error = Infallible;
}

impl OutputPin for NoEnablePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// STEP/DIR stepper on GPIO outputs
pub struct StepDirStepper<DIR, STEP, EN, D> {
    dir: DIR,
    step: STEP,
    enable: EN,
    delay: D,
    /// Delay after each step toggle
    step_delay_ns: u32,
    /// If true, driver enabled = EN pin LOW
    enable_inverted: bool,
    /// Current STEP output level
    step_level: bool,
    enabled: bool,
    direction: Direction,
}

impl<DIR, STEP, EN, D> StepDirStepper<DIR, STEP, EN, D>
where
    DIR: OutputPin,
    STEP: OutputPin,
    EN: OutputPin,
    D: DelayNs,
{
    /// Create a new driver and put the outputs in their idle state
    ///
    /// The driver starts disabled with STEP low. The per-step delay is
    /// derived from the full-travel calibration.
    pub fn new(
        dir: DIR,
        step: STEP,
        enable: EN,
        delay: D,
        config: &StepperConfig,
    ) -> Result<Self, StepperError> {
        let step_delay_ns = config
            .step_delay_ns()
            .map_err(|_| StepperError::InvalidConfig)?;

        let mut stepper = Self {
            dir,
            step,
            enable,
            delay,
            step_delay_ns,
            enable_inverted: config.enable_inverted,
            step_level: false,
            enabled: true,
            direction: Direction::Clockwise,
        };

        stepper.set_enabled(false)?;
        stepper
            .step
            .set_low()
            .map_err(|_| StepperError::StepPin)?;

        Ok(stepper)
    }

    /// Delay between step toggles in nanoseconds
    pub fn step_delay_ns(&self) -> u32 {
        self.step_delay_ns
    }

    /// Direction of the current or last move
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Drive the EN pin, honouring its polarity
    fn set_enabled(&mut self, enabled: bool) -> Result<(), StepperError> {
        // Normal: enabled=true, inverted=false → high
        // Inverted: enabled=true, inverted=true → low
        let level = PinState::from(enabled != self.enable_inverted);
        self.enable
            .set_state(level)
            .map_err(|_| StepperError::EnablePin)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Set DIR and emit `steps` toggles
    async fn run_steps(&mut self, direction: Direction, steps: u32) -> Result<(), StepperError> {
        self.dir
            .set_state(PinState::from(direction.pin_level()))
            .map_err(|_| StepperError::DirectionPin)?;
        self.direction = direction;

        for _ in 0..steps {
            let next = !self.step_level;
            self.step
                .set_state(PinState::from(next))
                .map_err(|_| StepperError::StepPin)?;
            self.step_level = next;

            self.delay.delay_ns(self.step_delay_ns).await;
        }

        Ok(())
    }

    /// Take the pins and delay back
    pub fn release(self) -> (DIR, STEP, EN, D) {
        (self.dir, self.step, self.enable, self.delay)
    }
}

impl<DIR, STEP, EN, D> StepperDriver for StepDirStepper<DIR, STEP, EN, D>
where
    DIR: OutputPin,
    STEP: OutputPin,
    EN: OutputPin,
    D: DelayNs,
{
    async fn move_steps(&mut self, direction: Direction, steps: u32) -> Result<(), StepperError> {
        self.set_enabled(true)?;

        let moved = self.run_steps(direction, steps).await;

        // Release the motor even if a step failed
        let released = self.set_enabled(false);
        moved.and(released)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use proptest::prelude::*;

    use super::*;
    use crate::sim::{SimClock, SimDelay, SimLine, SimOutputPin};

    struct Rig {
        dir: SimLine,
        step: SimLine,
        enable: SimLine,
        clock: SimClock,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                dir: SimLine::new(),
                step: SimLine::new(),
                enable: SimLine::new(),
                clock: SimClock::new(),
            }
        }

        fn stepper(
            &self,
            config: &StepperConfig,
        ) -> StepDirStepper<SimOutputPin<'_>, SimOutputPin<'_>, SimOutputPin<'_>, SimDelay<'_>> {
            StepDirStepper::new(
                SimOutputPin::new(&self.dir),
                SimOutputPin::new(&self.step),
                SimOutputPin::new(&self.enable),
                self.clock.delay(),
                config,
            )
            .unwrap()
        }
    }

    #[test]
    fn test_idle_after_construction() {
        let rig = Rig::new();
        let stepper = rig.stepper(&StepperConfig::default());

        assert!(!stepper.is_enabled());
        // Active-low enable: idle is HIGH
        assert!(rig.enable.level());
        assert!(!rig.step.level());
        assert_eq!(stepper.step_delay_ns(), 1_250_000);
    }

    #[test]
    fn test_move_toggles_and_releases() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());
        let enable_edges = rig.enable.transitions();

        block_on(stepper.move_steps(Direction::Clockwise, 10)).unwrap();

        assert_eq!(rig.step.transitions(), 10);
        assert!(rig.dir.level());
        assert!(rig.enable.level());
        assert!(!stepper.is_enabled());
        // One assert, one release
        assert_eq!(rig.enable.transitions() - enable_edges, 2);
        // 10 × 1.25 ms
        assert_eq!(rig.clock.now_ns(), 12_500_000);
    }

    #[test]
    fn test_direction_level() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());

        block_on(stepper.move_steps(Direction::CounterClockwise, 3)).unwrap();
        assert!(!rig.dir.level());
        assert_eq!(stepper.direction(), Direction::CounterClockwise);

        block_on(stepper.move_steps(Direction::Clockwise, 3)).unwrap();
        assert!(rig.dir.level());
    }

    #[test]
    fn test_zero_steps_only_gates_enable() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());
        let enable_edges = rig.enable.transitions();

        block_on(stepper.move_steps(Direction::Clockwise, 0)).unwrap();

        assert_eq!(rig.step.transitions(), 0);
        assert_eq!(rig.enable.transitions() - enable_edges, 2);
        assert!(!stepper.is_enabled());
        assert_eq!(rig.clock.now_ns(), 0);
    }

    #[test]
    fn test_active_high_enable() {
        let rig = Rig::new();
        let config = StepperConfig {
            enable_inverted: false,
            ..Default::default()
        };
        let mut stepper = rig.stepper(&config);
        assert!(!rig.enable.level());

        block_on(stepper.move_steps(Direction::Clockwise, 2)).unwrap();
        assert!(!rig.enable.level());
        assert_eq!(rig.enable.transitions(), 2);
    }

    #[test]
    fn test_step_fault_releases_motor() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());
        rig.step.set_faulty(true);

        let result = block_on(stepper.move_steps(Direction::Clockwise, 5));

        assert_eq!(result, Err(StepperError::StepPin));
        assert!(!stepper.is_enabled());
        assert!(rig.enable.level());
    }

    #[test]
    fn test_enable_fault_reported() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());
        rig.enable.set_faulty(true);

        let result = block_on(stepper.move_steps(Direction::Clockwise, 5));

        assert_eq!(result, Err(StepperError::EnablePin));
        assert_eq!(rig.step.transitions(), 0);
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let rig = Rig::new();
        let config = StepperConfig {
            full_travel_time_ms: 0,
            ..Default::default()
        };

        let result = StepDirStepper::new(
            SimOutputPin::new(&rig.dir),
            SimOutputPin::new(&rig.step),
            NoEnablePin,
            rig.clock.delay(),
            &config,
        );
        assert!(matches!(result, Err(StepperError::InvalidConfig)));
    }

    #[test]
    fn test_without_enable_pin() {
        let rig = Rig::new();
        let mut stepper = StepDirStepper::new(
            SimOutputPin::new(&rig.dir),
            SimOutputPin::new(&rig.step),
            NoEnablePin,
            rig.clock.delay(),
            &StepperConfig::default(),
        )
        .unwrap();

        block_on(stepper.move_steps(Direction::Clockwise, 4)).unwrap();
        assert_eq!(rig.step.transitions(), 4);
    }

    #[test]
    fn test_release_returns_idle_pins() {
        let rig = Rig::new();
        let mut stepper = rig.stepper(&StepperConfig::default());
        block_on(stepper.move_steps(Direction::Clockwise, 3)).unwrap();

        let (_, mut step, mut enable, _) = stepper.release();

        // Odd step count leaves STEP high; the pins stay usable
        assert!(rig.step.level());
        step.set_low().unwrap();
        assert!(!rig.step.level());
        assert!(rig.enable.level());
        enable.set_low().unwrap();
        assert!(!rig.enable.level());
    }

    proptest! {
        #[test]
        fn toggles_exactly_n_times(n in 0u32..500) {
            let rig = Rig::new();
            let mut stepper = rig.stepper(&StepperConfig::default());
            prop_assert!(rig.enable.level());

            block_on(stepper.move_steps(Direction::Clockwise, n)).unwrap();

            prop_assert_eq!(rig.step.transitions(), n);
            prop_assert!(rig.enable.level());
            prop_assert!(!stepper.is_enabled());
        }
    }
}
