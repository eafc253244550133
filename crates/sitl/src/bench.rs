//! Simulated test bench
//!
//! The bench owns a shared world of drums. [`SimStepper`] and [`SimHall`]
//! handles give the firmware access to it through the same traits the board
//! bindings implement, and [`SimClock`] reports bench time. Time only moves
//! when the test calls [`SimBench::advance_us`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use splitflap_core::traits::{EdgeLatch, HallLevel, HallSensor, Stepper, TimeSource};

use crate::drum::{Drum, DrumConfig};
use crate::error::SimulatorError;

/// How long an injected sensor glitch lasts (us).
pub const GLITCH_PULSE_US: u64 = 5_000;

type World = Arc<Mutex<Vec<Drum>>>;

fn lock(world: &World) -> MutexGuard<'_, Vec<Drum>> {
    // Poisoning only follows a failed assertion in another test thread.
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Random sensor noise.
struct Noise {
    rng: StdRng,
    probability_per_ms: f64,
}

/// Bench of simulated drums.
pub struct SimBench {
    world: World,
    clock: SimClock,
    edges: Arc<EdgeLatch>,
    noise: Option<Noise>,
    glitches_injected: u32,
}

impl SimBench {
    /// Bench with one drum per config, all shafts at step 0.
    pub fn new(configs: Vec<DrumConfig>) -> Result<Self, SimulatorError> {
        for config in &configs {
            config.validate()?;
        }
        let drums = configs.into_iter().map(Drum::new).collect();
        Ok(Self {
            world: Arc::new(Mutex::new(drums)),
            clock: SimClock::default(),
            edges: Arc::new(EdgeLatch::new()),
            noise: None,
            glitches_injected: 0,
        })
    }

    /// Bench of `units` drums matching the reference unit parameters.
    pub fn reference(units: u8) -> Result<Self, SimulatorError> {
        Self::new((0..units).map(DrumConfig::for_unit).collect())
    }

    /// Number of drums.
    pub fn units(&self) -> usize {
        lock(&self.world).len()
    }

    /// Stepper handle driving `unit`.
    pub fn stepper(&self, unit: u8) -> Result<SimStepper, SimulatorError> {
        self.check_unit(unit)?;
        Ok(SimStepper {
            world: Arc::clone(&self.world),
            unit: usize::from(unit),
        })
    }

    /// Stepper handles for every drum, in unit order.
    pub fn steppers<const N: usize>(&self) -> Result<[SimStepper; N], SimulatorError> {
        let units = self.units();
        if units != N {
            return Err(SimulatorError::UnitCountMismatch {
                bench: units,
                system: N,
            });
        }
        Ok(std::array::from_fn(|unit| SimStepper {
            world: Arc::clone(&self.world),
            unit,
        }))
    }

    /// Sensor handle covering every drum.
    pub fn hall(&self) -> SimHall {
        SimHall {
            world: Arc::clone(&self.world),
            reads: 0,
        }
    }

    /// Clock handle.
    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// Latch raised on every sensor transition.
    pub fn edges(&self) -> &EdgeLatch {
        &self.edges
    }

    /// Bench time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    /// Advance bench time, stepping drums and raising the edge latch on
    /// every change of a reported sensor level.
    pub fn advance_us(&mut self, duration_us: u64) {
        let target_us = self.now_us() + duration_us;

        while let Some(event_us) = self.next_event_us(target_us) {
            self.clock.set_us(event_us);
            self.process_event(event_us);
        }
        self.clock.set_us(target_us);
    }

    /// Advance bench time by whole milliseconds.
    pub fn advance_ms(&mut self, duration_ms: u64) {
        self.advance_us(duration_ms * 1_000);
    }

    /// Set the shaft position of `unit` without turning through it.
    pub fn set_shaft(&mut self, unit: u8, step: u32) -> Result<(), SimulatorError> {
        self.with_drum(unit, |drum| drum.shaft = step % drum.config.steps_per_rev)
    }

    /// Letter currently showing on `unit`.
    pub fn displayed_letter(&self, unit: u8) -> Result<char, SimulatorError> {
        lock(&self.world)
            .get(usize::from(unit))
            .map(Drum::letter)
            .ok_or(SimulatorError::UnitNotFound(unit))
    }

    /// Letters showing on every drum, left to right.
    pub fn displayed_text(&self) -> String {
        lock(&self.world).iter().map(Drum::letter).collect()
    }

    /// Shaft steps `unit` has actually turned since the bench was built.
    pub fn steps_turned(&self, unit: u8) -> Result<u64, SimulatorError> {
        lock(&self.world)
            .get(usize::from(unit))
            .map(|drum| drum.steps_turned)
            .ok_or(SimulatorError::UnitNotFound(unit))
    }

    /// Invert the sensor of `unit` for [`GLITCH_PULSE_US`]: a spurious
    /// transition followed by its reversal.
    pub fn inject_glitch(&mut self, unit: u8) -> Result<(), SimulatorError> {
        let until_us = self.now_us() + GLITCH_PULSE_US;
        self.with_drum(unit, |drum| drum.glitch_until_us = Some(until_us))?;
        self.glitches_injected += 1;
        self.edges.raise();
        Ok(())
    }

    /// Stop `unit`'s drum from turning. The motor keeps consuming steps.
    pub fn jam(&mut self, unit: u8) -> Result<(), SimulatorError> {
        self.with_drum(unit, |drum| drum.jammed = true)
    }

    /// Free a jammed drum.
    pub fn unjam(&mut self, unit: u8) -> Result<(), SimulatorError> {
        self.with_drum(unit, |drum| drum.jammed = false)
    }

    /// Make the driver of `unit` report busy forever.
    pub fn hang_driver(&mut self, unit: u8) -> Result<(), SimulatorError> {
        self.with_drum(unit, |drum| drum.hung = true)
    }

    /// Inject glitches at random: every millisecond each drum glitches with
    /// `probability_per_ms`. Seeded, so runs are repeatable.
    pub fn set_noise(&mut self, seed: u64, probability_per_ms: f64) {
        self.noise = Some(Noise {
            rng: StdRng::seed_from_u64(seed),
            probability_per_ms: probability_per_ms.clamp(0.0, 1.0),
        });
    }

    /// Stop injecting random glitches.
    pub fn clear_noise(&mut self) {
        self.noise = None;
    }

    /// Glitches injected so far, by hand or by noise.
    pub fn glitches_injected(&self) -> u32 {
        self.glitches_injected
    }

    /// Model a controller reset: every driver loses its queued work and
    /// the edge latch is dropped. Drums keep their shaft positions and faults.
    pub fn power_cycle(&mut self) {
        for drum in lock(&self.world).iter_mut() {
            drum.stop();
        }
        self.edges.take();
    }

    fn check_unit(&self, unit: u8) -> Result<(), SimulatorError> {
        if usize::from(unit) < self.units() {
            Ok(())
        } else {
            Err(SimulatorError::UnitNotFound(unit))
        }
    }

    fn with_drum(&mut self, unit: u8, f: impl FnOnce(&mut Drum)) -> Result<(), SimulatorError> {
        let mut drums = lock(&self.world);
        let drum = drums
            .get_mut(usize::from(unit))
            .ok_or(SimulatorError::UnitNotFound(unit))?;
        f(drum);
        Ok(())
    }

    /// Earliest step, glitch end or noise sample after now and not after
    /// `target_us`.
    fn next_event_us(&self, target_us: u64) -> Option<u64> {
        let now_us = self.now_us();
        let drums = lock(&self.world);

        let steps = drums.iter().filter(|drum| drum.has_work()).map(|drum| {
            let interval = drum.config.step_interval_us;
            (now_us / interval + 1) * interval
        });
        let glitch_ends = drums.iter().filter_map(|drum| drum.glitch_until_us);
        let noise = self.noise.as_ref().map(|_| (now_us / 1_000 + 1) * 1_000);

        steps
            .chain(glitch_ends)
            .chain(noise)
            .map(|event_us| event_us.max(now_us + 1))
            .min()
            .filter(|event_us| *event_us <= target_us)
    }

    fn process_event(&mut self, now_us: u64) {
        let mut edge = false;
        let mut injected = 0;
        {
            let mut drums = lock(&self.world);
            for drum in drums.iter_mut() {
                let before = drum.reported_level();

                if drum.has_work() && now_us % drum.config.step_interval_us == 0 {
                    drum.step();
                }
                if drum.glitch_until_us.is_some_and(|until_us| until_us <= now_us) {
                    drum.glitch_until_us = None;
                }
                if let Some(noise) = self.noise.as_mut() {
                    if now_us % 1_000 == 0
                        && drum.glitch_until_us.is_none()
                        && noise.rng.gen_bool(noise.probability_per_ms)
                    {
                        drum.glitch_until_us = Some(now_us + GLITCH_PULSE_US);
                        injected += 1;
                    }
                }

                edge |= drum.reported_level() != before;
            }
        }

        self.glitches_injected += injected;
        if edge {
            self.edges.raise();
        }
    }
}

/// [`Stepper`] handle for one simulated drum.
#[derive(Clone)]
pub struct SimStepper {
    world: World,
    unit: usize,
}

impl SimStepper {
    fn with_drum<R>(&self, f: impl FnOnce(&mut Drum) -> R) -> Option<R> {
        lock(&self.world).get_mut(self.unit).map(f)
    }
}

impl Stepper for SimStepper {
    fn move_by(&mut self, steps: i32) {
        // No direction line on the drive, as on the board.
        if let Ok(steps) = u32::try_from(steps) {
            self.with_drum(|drum| drum.remaining = drum.remaining.saturating_add(steps));
        }
    }

    fn run_forward(&mut self) {
        self.with_drum(|drum| drum.continuous = true);
    }

    fn is_running(&self) -> bool {
        lock(&self.world)
            .get(self.unit)
            .is_some_and(Drum::is_running)
    }

    fn force_stop(&mut self) {
        self.with_drum(Drum::stop);
    }

    fn force_stop_and_zero(&mut self) {
        self.with_drum(Drum::stop);
    }
}

/// [`HallSensor`] handle over every simulated drum.
#[derive(Clone)]
pub struct SimHall {
    world: World,
    reads: u64,
}

impl SimHall {
    /// Sensor reads so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl HallSensor for SimHall {
    fn read(&mut self, unit: u8) -> HallLevel {
        self.reads += 1;
        lock(&self.world)
            .get(usize::from(unit))
            .map_or(HallLevel::Clear, Drum::reported_level)
    }
}

/// Bench clock shared by every handle.
#[derive(Clone, Default)]
pub struct SimClock {
    now_us: Arc<AtomicU64>,
}

impl SimClock {
    /// Bench time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::Acquire)
    }

    fn set_us(&self, now_us: u64) {
        self.now_us.store(now_us, Ordering::Release);
    }
}

impl TimeSource for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench(units: u8) -> SimBench {
        SimBench::new(vec![DrumConfig::default(); usize::from(units)]).unwrap()
    }

    #[test]
    fn test_move_turns_one_step_per_interval() {
        let mut bench = bench(1);
        let mut stepper = bench.stepper(0).unwrap();

        stepper.move_by(10);
        bench.advance_ms(10);
        assert_eq!(bench.steps_turned(0).unwrap(), 5);
        assert!(stepper.is_running());

        bench.advance_ms(10);
        assert_eq!(bench.steps_turned(0).unwrap(), 10);
        assert!(!stepper.is_running());
    }

    #[test]
    fn test_negative_move_is_ignored() {
        let mut bench = bench(1);
        let mut stepper = bench.stepper(0).unwrap();
        stepper.move_by(-5);
        bench.advance_ms(20);
        assert_eq!(bench.steps_turned(0).unwrap(), 0);
    }

    #[test]
    fn test_marker_entry_raises_edge() {
        let mut bench = bench(2);
        bench.set_shaft(1, 495).unwrap();
        bench.stepper(1).unwrap().run_forward();

        bench.advance_ms(8);
        assert!(!bench.edges().is_raised());
        bench.advance_ms(2);
        assert!(bench.edges().take());

        let mut hall = bench.hall();
        assert_eq!(hall.read(1), HallLevel::Detected);
        assert_eq!(hall.read(0), HallLevel::Clear);
    }

    #[test]
    fn test_glitch_toggles_twice() {
        let mut bench = bench(1);
        let mut hall = bench.hall();

        bench.inject_glitch(0).unwrap();
        assert!(bench.edges().take());
        assert_eq!(hall.read(0), HallLevel::Detected);

        bench.advance_us(GLITCH_PULSE_US);
        assert!(bench.edges().take());
        assert_eq!(hall.read(0), HallLevel::Clear);
        assert_eq!(bench.glitches_injected(), 1);
    }

    #[test]
    fn test_clock_follows_bench_time() {
        let mut bench = bench(1);
        let clock = bench.clock();
        bench.advance_us(2_500);
        assert_eq!(clock.now_ms(), 2);
        assert_eq!(bench.now_us(), 2_500);
    }

    #[test]
    fn test_power_cycle_drops_queued_work() {
        let mut bench = bench(1);
        let mut stepper = bench.stepper(0).unwrap();
        stepper.move_by(100);
        bench.jam(0).unwrap();
        bench.power_cycle();
        assert!(!stepper.is_running());
        bench.advance_ms(10);
        assert_eq!(bench.steps_turned(0).unwrap(), 0);
    }

    #[test]
    fn test_seeded_noise_is_repeatable() {
        let run = || {
            let mut bench = bench(4);
            bench.set_noise(7, 0.01);
            bench.advance_ms(1_000);
            bench.glitches_injected()
        };
        let first = run();
        assert!(first > 0);
        assert_eq!(first, run());
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        let mut bench = bench(2);
        assert!(matches!(bench.jam(2), Err(SimulatorError::UnitNotFound(2))));
        assert!(matches!(
            bench.steppers::<3>(),
            Err(SimulatorError::UnitCountMismatch { bench: 2, system: 3 })
        ));
    }
}
