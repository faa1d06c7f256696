//! Simulated hardware for host-side testing
//!
//! Lets the stepper, encoder and lock run unchanged on the host, driven by
//! `embassy_futures::block_on` and `select`/`join` on a single thread:
//!
//! - [`SimClock`] / [`SimDelay`]: virtual time. A delay only completes
//!   once it is the first one pending, ordered by deadline and then by
//!   registration, so several cooperative tasks interleave exactly as
//!   their delays dictate and the virtual clock jumps straight from one
//!   deadline to the next. All tasks must be polled together
//!   (`join`/`select` under one `block_on`).
//! - [`SimLine`] with [`SimOutputPin`] / [`SimInputPin`]: a wire with a
//!   level, a transition count and an injectable fault.
//! - [`SimDisc`] / [`SimDiscPin`]: an encoder disc whose level flips every
//!   N toggles of the step line, can be jammed, or left disconnected.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;

/// Maximum number of delays pending at the same time
pub const MAX_PENDING: usize = 8;

/// Virtual clock shared by all simulated delays
#[derive(Debug)]
pub struct SimClock {
    now_ns: Cell<u64>,
    /// `(deadline, registration number)` of each pending delay
    pending: RefCell<[Option<(u64, u64)>; MAX_PENDING]>,
    next_seq: Cell<u64>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Create a clock at t = 0
    pub const fn new() -> Self {
        Self {
            now_ns: Cell::new(0),
            pending: RefCell::new([None; MAX_PENDING]),
            next_seq: Cell::new(0),
        }
    }

    /// Current virtual time in nanoseconds
    pub fn now_ns(&self) -> u64 {
        self.now_ns.get()
    }

    /// Create a delay provider on this clock
    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay { clock: self }
    }

    fn register(&self, deadline: u64) -> usize {
        let mut pending = self.pending.borrow_mut();
        let Some(slot) = pending.iter().position(Option::is_none) else {
            panic!("more than {} simulated delays pending", MAX_PENDING);
        };
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        pending[slot] = Some((deadline, seq));
        slot
    }

    fn release(&self, slot: usize) {
        self.pending.borrow_mut()[slot] = None;
    }

    /// Check if `slot` is due first; equal deadlines go in registration order
    fn is_earliest(&self, slot: usize) -> bool {
        let pending = self.pending.borrow();
        let Some(own) = pending[slot] else {
            return false;
        };
        pending.iter().flatten().all(|other| own <= *other)
    }

    fn advance_to(&self, deadline: u64) {
        if deadline > self.now_ns.get() {
            self.now_ns.set(deadline);
        }
    }
}

/// `DelayNs` provider running on a [`SimClock`]
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl DelayNs for SimDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        Sleep::new(self.clock, ns).await
    }
}

/// One pending delay
struct Sleep<'a> {
    clock: &'a SimClock,
    deadline: u64,
    slot: Option<usize>,
}

impl<'a> Sleep<'a> {
    fn new(clock: &'a SimClock, ns: u32) -> Self {
        Self {
            clock,
            deadline: clock.now_ns() + ns as u64,
            slot: None,
        }
    }
}

impl Future for Sleep<'_> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(slot) = self.slot else {
            // Stay pending for one round so every other task can reach its
            // own delay before time moves on
            let slot = self.clock.register(self.deadline);
            self.slot = Some(slot);
            cx.waker().wake_by_ref();
            return Poll::Pending;
        };

        if self.clock.is_earliest(slot) {
            self.clock.release(slot);
            self.slot = None;
            self.clock.advance_to(self.deadline);
            Poll::Ready(())
        } else {
            // Let the other tasks with earlier deadlines run first
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

impl Drop for Sleep<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.clock.release(slot);
        }
    }
}

/// Injected pin fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Simulated wire
#[derive(Debug, Default)]
pub struct SimLine {
    level: Cell<bool>,
    transitions: Cell<u32>,
    faulty: Cell<bool>,
}

impl SimLine {
    /// Create a line at LOW with no transitions
    pub const fn new() -> Self {
        Self {
            level: Cell::new(false),
            transitions: Cell::new(0),
            faulty: Cell::new(false),
        }
    }

    /// Current level
    pub fn level(&self) -> bool {
        self.level.get()
    }

    /// Number of level changes so far
    pub fn transitions(&self) -> u32 {
        self.transitions.get()
    }

    /// Drive the line from the test side
    pub fn set_level(&self, level: bool) {
        if level != self.level.get() {
            self.level.set(level);
            self.transitions.set(self.transitions.get() + 1);
        }
    }

    /// Make every pin access on this line fail (or stop failing)
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.set(faulty);
    }

    fn check(&self) -> Result<(), SimPinError> {
        if self.faulty.get() {
            Err(SimPinError)
        } else {
            Ok(())
        }
    }
}

/// Output pin driving a [`SimLine`]
#[derive(Debug)]
pub struct SimOutputPin<'a> {
    line: &'a SimLine,
}

impl<'a> SimOutputPin<'a> {
    /// Attach an output to `line`
    pub fn new(line: &'a SimLine) -> Self {
        Self { line }
    }
}

impl ErrorType for SimOutputPin<'_> {
    type Error = SimPinError;
}

impl OutputPin for SimOutputPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.line.check()?;
        self.line.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.line.check()?;
        self.line.set_level(true);
        Ok(())
    }
}

/// Input pin reading a [`SimLine`]
#[derive(Debug)]
pub struct SimInputPin<'a> {
    line: &'a SimLine,
}

impl<'a> SimInputPin<'a> {
    /// Attach an input to `line`
    pub fn new(line: &'a SimLine) -> Self {
        Self { line }
    }
}

impl ErrorType for SimInputPin<'_> {
    type Error = SimPinError;
}

impl InputPin for SimInputPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.line.check()?;
        Ok(self.line.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Encoder disc coupled to the stepper shaft
#[derive(Debug)]
pub struct SimDisc {
    /// Step toggles per encoder level change (0 = disconnected)
    toggles_per_edge: Cell<u32>,
    jammed: Cell<bool>,
    /// Last level seen by the pin, held while jammed
    level: Cell<bool>,
}

impl SimDisc {
    /// Create a disc whose output flips every `toggles_per_edge` steps
    pub const fn new(toggles_per_edge: u32) -> Self {
        Self {
            toggles_per_edge: Cell::new(toggles_per_edge),
            jammed: Cell::new(false),
            level: Cell::new(false),
        }
    }

    /// Create a disc that never changes level (cable unplugged)
    pub const fn disconnected() -> Self {
        Self::new(0)
    }

    /// Stop the disc at its current level, or let it turn again
    pub fn set_jammed(&self, jammed: bool) {
        self.jammed.set(jammed);
    }

    /// Change the coupling ratio
    pub fn set_toggles_per_edge(&self, toggles_per_edge: u32) {
        self.toggles_per_edge.set(toggles_per_edge);
    }
}

/// Encoder input derived from the step line and a [`SimDisc`]
#[derive(Debug)]
pub struct SimDiscPin<'a> {
    steps: &'a SimLine,
    disc: &'a SimDisc,
}

impl<'a> SimDiscPin<'a> {
    /// Couple `disc` to the toggles seen on `steps`
    pub fn new(steps: &'a SimLine, disc: &'a SimDisc) -> Self {
        Self { steps, disc }
    }
}

impl ErrorType for SimDiscPin<'_> {
    type Error = Infallible;
}

impl InputPin for SimDiscPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if !self.disc.jammed.get() {
            let level = match self.disc.toggles_per_edge.get() {
                0 => false,
                n => (self.steps.transitions() / n) % 2 == 1,
            };
            self.disc.level.set(level);
        }
        Ok(self.disc.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
