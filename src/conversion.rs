//! Conversion Controller
//!
//! The busy state is a typed state machine shared between the scan loop and
//! the ADC completion interrupt. The loop only moves it `Idle -> Busy`, the
//! interrupt only `Busy -> Idle`, so each transition has a single writer.
//! Entering a state drives the busy indicator line to match.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use typed_fsm::{Transition, state_machine};

/// One digitized value.
pub type Sample = u16;

/// Capability that arms and triggers one single-shot conversion of the
/// currently routed input.
pub trait ConversionTrigger {
    fn start_conversion(&mut self);
}

/// Public view of the busy state machine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusyState {
    Idle,
    Busy,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub started: u32,
    pub completed: u32,
}

// FSM Context
pub struct ConversionContext {
    pub indicator: bool,     // Level the busy line should show
    pub last_result: Sample, // Latched by the completion handler
    pub stats: ConversionStats,
}

impl ConversionContext {
    const fn new() -> Self {
        Self { indicator: false, last_result: 0, stats: ConversionStats { started: 0, completed: 0 } }
    }
}

// FSM Events
#[derive(Clone, Copy, Debug)]
pub enum ConversionEvent {
    Start,
    Complete(Sample),
}

state_machine! {
    Name: ConversionFsm,
    Context: ConversionContext,
    Event: ConversionEvent,
    States: {
        Idle => {
            entry: |ctx| {
                ctx.indicator = false;
            }
            process: |ctx, evt| {
                match evt {
                    ConversionEvent::Start => Transition::To(ConversionFsm::Busy),
                    ConversionEvent::Complete(value) => {
                        // Stray completion: keep the value, stay idle
                        ctx.last_result = *value;
                        Transition::None
                    }
                }
            }
        },

        Busy => {
            entry: |ctx| {
                ctx.indicator = true;
                ctx.stats.started = ctx.stats.started.wrapping_add(1);
            }
            process: |ctx, evt| {
                match evt {
                    ConversionEvent::Start => Transition::None, // One outstanding at most
                    ConversionEvent::Complete(value) => {
                        ctx.last_result = *value;
                        ctx.stats.completed = ctx.stats.completed.wrapping_add(1);
                        Transition::To(ConversionFsm::Idle)
                    }
                }
            }
        }
    }
}

struct Slot<L> {
    fsm: ConversionFsm,
    ctx: ConversionContext,
    line: L,
}

impl<L: OutputPin> Slot<L> {
    fn dispatch(&mut self, event: ConversionEvent) {
        self.fsm.dispatch(&mut self.ctx, &event);
        let _ = if self.ctx.indicator { self.line.set_high() } else { self.line.set_low() };
    }

    fn state(&self) -> BusyState {
        match self.fsm {
            ConversionFsm::Idle => BusyState::Idle,
            ConversionFsm::Busy => BusyState::Busy,
        }
    }
}

/// Conversion state reachable from both the scan loop and the completion
/// interrupt. Meant to live in a `static`.
///
/// Until [`install`](Self::install) runs the slot reads as idle with a zero
/// result.
pub struct SharedConversion<L> {
    slot: Mutex<RefCell<Option<Slot<L>>>>,
}

impl<L> SharedConversion<L> {
    pub const fn new() -> Self {
        Self { slot: Mutex::new(RefCell::new(None)) }
    }
}

impl<L> Default for SharedConversion<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: OutputPin> SharedConversion<L> {
    /// Takes the busy indicator line and enters `Idle`.
    pub fn install(&self, line: L) {
        let mut slot = Slot { fsm: ConversionFsm::Idle, ctx: ConversionContext::new(), line };
        slot.fsm.init(&mut slot.ctx);
        let _ = slot.line.set_low();

        critical_section::with(|cs| {
            self.slot.borrow_ref_mut(cs).replace(slot);
        });
        debug!("conversion slot installed");
    }

    /// Asserts the busy line, then fires the trigger.
    ///
    /// The caller must have observed [`BusyState::Idle`]. The trigger runs
    /// outside the critical section, so a completion interrupt firing
    /// immediately already finds the slot `Busy`.
    pub fn start<T: ConversionTrigger + ?Sized>(&self, trigger: &mut T) {
        self.with_slot(|slot| {
            debug_assert_eq!(slot.state(), BusyState::Idle, "conversion already outstanding");
            slot.dispatch(ConversionEvent::Start);
        });
        trigger.start_conversion();
    }

    /// Completion handler body. Latches `value` and returns to `Idle`.
    pub fn on_conversion_complete(&self, value: Sample) {
        self.with_slot(|slot| slot.dispatch(ConversionEvent::Complete(value)));
    }

    pub fn state(&self) -> BusyState {
        self.with_slot(|slot| slot.state()).unwrap_or(BusyState::Idle)
    }

    pub fn is_busy(&self) -> bool {
        self.state() == BusyState::Busy
    }

    /// Most recently completed sample. Stale until the first completion.
    pub fn last_result(&self) -> Sample {
        self.with_slot(|slot| slot.ctx.last_result).unwrap_or(0)
    }

    pub fn stats(&self) -> ConversionStats {
        self.with_slot(|slot| slot.ctx.stats).unwrap_or_default()
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Slot<L>) -> R) -> Option<R> {
        critical_section::with(|cs| self.slot.borrow_ref_mut(cs).as_mut().map(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePin, FakeTrigger};

    fn installed() -> (SharedConversion<FakePin>, FakePin) {
        let line = FakePin::default();
        let conversion = SharedConversion::new();
        conversion.install(line.clone());
        (conversion, line)
    }

    #[test]
    fn uninstalled_slot_reads_idle() {
        let conversion: SharedConversion<FakePin> = SharedConversion::new();
        assert_eq!(conversion.state(), BusyState::Idle);
        assert_eq!(conversion.last_result(), 0);
        assert_eq!(conversion.stats(), ConversionStats::default());
    }

    #[test]
    fn uninstalled_slot_still_fires_trigger() {
        let conversion: SharedConversion<FakePin> = SharedConversion::new();
        let mut trigger = FakeTrigger::stalled();

        conversion.start(&mut trigger);

        assert_eq!(trigger.starts(), 1);
        assert_eq!(conversion.state(), BusyState::Idle);

        conversion.on_conversion_complete(640);
        assert_eq!(conversion.last_result(), 0);
        assert_eq!(conversion.stats(), ConversionStats::default());
    }

    #[test]
    fn install_enters_idle_with_line_low() {
        let (conversion, line) = installed();
        assert_eq!(conversion.state(), BusyState::Idle);
        assert!(!line.is_high());
    }

    #[test]
    fn start_asserts_busy_line_then_triggers() {
        let (conversion, line) = installed();
        let mut trigger = FakeTrigger::stalled();

        conversion.start(&mut trigger);

        assert!(conversion.is_busy());
        assert!(line.is_high());
        assert_eq!(trigger.starts(), 1);
        assert_eq!(conversion.stats(), ConversionStats { started: 1, completed: 0 });
    }

    #[test]
    fn completion_latches_result_and_clears_busy() {
        let (conversion, line) = installed();
        conversion.start(&mut FakeTrigger::stalled());

        conversion.on_conversion_complete(812);

        assert_eq!(conversion.state(), BusyState::Idle);
        assert!(!line.is_high());
        assert_eq!(conversion.last_result(), 812);
        assert_eq!(conversion.stats(), ConversionStats { started: 1, completed: 1 });
    }

    #[test]
    fn last_result_is_idempotent() {
        let (conversion, _line) = installed();
        conversion.start(&mut FakeTrigger::stalled());
        conversion.on_conversion_complete(300);

        let first = conversion.last_result();
        assert_eq!(conversion.last_result(), first);
        assert_eq!(conversion.last_result(), first);
    }

    #[test]
    fn stray_completion_while_idle_keeps_state() {
        let (conversion, line) = installed();

        conversion.on_conversion_complete(55);

        assert_eq!(conversion.state(), BusyState::Idle);
        assert!(!line.is_high());
        assert_eq!(conversion.last_result(), 55);
        assert_eq!(conversion.stats().completed, 0);
    }

    #[test]
    fn completion_inside_trigger_finds_busy_state() {
        let (conversion, line) = installed();
        let mut trigger = FakeTrigger::immediate(&conversion, |_| 1023);

        conversion.start(&mut trigger);

        assert_eq!(conversion.state(), BusyState::Idle);
        assert!(!line.is_high());
        assert_eq!(conversion.last_result(), 1023);
        assert_eq!(conversion.stats(), ConversionStats { started: 1, completed: 1 });
    }
}
