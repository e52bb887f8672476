use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{Network, NetworkConfig};
use crate::trainer::{Trainer, TrainerConfig};

/// Hard cap on ticks run by a single `advance` call. A long stall (debugger,
/// suspended laptop) drops its backlog instead of replaying it in one burst.
const MAX_TICKS_PER_ADVANCE: u32 = 240;

/// Top-level assembly: one network, one trainer, one tick clock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimConfig {
    pub network: NetworkConfig,
    pub trainer: TrainerConfig,
    /// Logical ticks per second of wall-clock time when driven by `advance`.
    pub tick_hz: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            trainer: TrainerConfig::default(),
            tick_hz: 60,
        }
    }
}

impl SimConfig {
    /// Check both halves plus their cross-constraints.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.network.validate()?;
        self.trainer.validate()?;
        if !(1..=1000).contains(&self.tick_hz) {
            return Err("tick_hz must be in [1, 1000]");
        }
        if self.trainer.input_pattern.len() > self.network.input_width {
            return Err("input_pattern is longer than the network's input_width");
        }
        Ok(())
    }

    /// Set the network PRNG seed (builder style).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.network.seed = seed;
        self
    }
}

/// Single-threaded simulation driver.
///
/// Owns the network and the trainer and advances them in lockstep, one
/// logical tick at a time. Construction starts paused; `play` / `pause`
/// gate the wall-clock driver, while `step` always works so a paused
/// simulation can be advanced tick by tick.
///
/// Rendering cadence is decoupled from simulation cadence: a frame loop
/// calls `advance` with the elapsed wall-clock time and the simulation
/// converts that into whole ticks at `tick_hz`, carrying the fractional
/// remainder forward.
#[derive(Debug, Clone)]
pub struct Simulation {
    net: Network,
    trainer: Trainer,
    running: bool,
    learning: bool,
    speed: f32,
    tick_hz: u32,
    /// Unconsumed wall-clock seconds carried between `advance` calls.
    accum: f32,
}

impl Simulation {
    pub fn new(cfg: SimConfig) -> Result<Self, &'static str> {
        cfg.validate()?;
        let tick_hz = cfg.tick_hz;
        let net = Network::new(cfg.network)?;
        let trainer = Trainer::new(cfg.trainer)?;
        Ok(Self {
            net,
            trainer,
            running: false,
            learning: true,
            speed: 1.0,
            tick_hz,
            accum: 0.0,
        })
    }

    pub fn play(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run exactly one tick, regardless of the play/pause flag.
    pub fn step(&mut self) {
        self.tick_once();
    }

    /// Convert elapsed wall-clock time into simulation ticks and run them.
    ///
    /// Returns the number of ticks actually run. While paused this returns
    /// zero and discards the elapsed time, so unpausing never replays the
    /// paused interval. Backlogs beyond `MAX_TICKS_PER_ADVANCE` are dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            self.accum = 0.0;
            return 0;
        }

        self.accum += elapsed.as_secs_f32();
        let due = (self.accum * self.tick_hz as f32) as u32;
        let ticks = due.min(MAX_TICKS_PER_ADVANCE);
        if due > ticks {
            self.accum = 0.0;
        } else {
            self.accum -= ticks as f32 / self.tick_hz as f32;
        }

        for _ in 0..ticks {
            self.tick_once();
        }
        ticks
    }

    /// Set the speed factor applied to every per-tick rate.
    ///
    /// Non-positive and non-finite values are rejected and the current
    /// speed is kept.
    pub fn set_speed(&mut self, speed: f32) -> Result<(), &'static str> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err("speed must be positive and finite");
        }
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Toggle plasticity. While disabled, weights, traces, and the trial
    /// loop are all frozen; the activity dynamics keep running.
    pub fn set_learning(&mut self, enabled: bool) {
        self.learning = enabled;
    }

    pub fn learning_enabled(&self) -> bool {
        self.learning
    }

    /// Inject an ad-hoc input pattern outside the trial schedule.
    pub fn inject_input(&mut self, pattern: &[f32]) -> Result<(), &'static str> {
        self.net.inject_input(pattern)
    }

    pub fn stimulate_region(&mut self, id: &str, strength: f32) -> Result<(), &'static str> {
        self.net.stimulate_region(id, strength)
    }

    pub fn stimulate_neuron(&mut self, id: usize, strength: f32) -> Result<(), &'static str> {
        self.net.stimulate_neuron(id, strength)
    }

    /// Reinitialize network and trainer state and pause. Safe mid-trial; the
    /// in-flight trial is discarded with everything else.
    pub fn reset(&mut self) {
        let Self { net, trainer, .. } = self;
        trainer.reset(net);
        self.running = false;
        self.accum = 0.0;
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    fn tick_once(&mut self) {
        let regularizer_rate = self.trainer.config().regularizer_rate;
        let trace_decay = self.trainer.config().trace_decay;
        self.net
            .update(self.speed, self.learning, regularizer_rate, trace_decay);
        if self.learning {
            let Self { net, trainer, .. } = self;
            trainer.tick(net);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.network = cfg.network.with_neurons_per_region(6);
        cfg.network.input_width = 3;
        cfg
    }

    #[test]
    fn starts_paused_and_step_still_works() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        assert!(!sim.is_running());

        for _ in 0..5 {
            sim.step();
        }
        assert_eq!(sim.network().tick(), 5);
    }

    #[test]
    fn advance_while_paused_runs_nothing() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        assert_eq!(sim.advance(Duration::from_secs(5)), 0);
        assert_eq!(sim.network().tick(), 0);

        // The paused interval is discarded, not replayed after unpausing.
        sim.play();
        assert_eq!(sim.advance(Duration::ZERO), 0);
        assert_eq!(sim.network().tick(), 0);
    }

    #[test]
    fn advance_carries_fractional_remainders() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        sim.play();

        // 8 ms at 60 Hz is under half a tick.
        assert_eq!(sim.advance(Duration::from_millis(8)), 0);
        // 8 + 9 ms crosses one tick period.
        assert_eq!(sim.advance(Duration::from_millis(9)), 1);
        assert_eq!(sim.network().tick(), 1);

        assert_eq!(sim.advance(Duration::from_millis(100)), 6);
    }

    #[test]
    fn advance_caps_runaway_backlogs() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        sim.play();
        let ran = sim.advance(Duration::from_secs(3600));
        assert_eq!(ran, 240);
        // The surplus was dropped, not deferred.
        assert_eq!(sim.advance(Duration::ZERO), 0);
    }

    #[test]
    fn set_speed_rejects_invalid_values() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        assert!(sim.set_speed(0.0).is_err());
        assert!(sim.set_speed(-1.0).is_err());
        assert!(sim.set_speed(f32::NAN).is_err());
        assert!(sim.set_speed(f32::INFINITY).is_err());
        assert_eq!(sim.speed(), 1.0);

        sim.set_speed(2.5).unwrap();
        assert_eq!(sim.speed(), 2.5);
    }

    #[test]
    fn config_cross_check_catches_long_patterns() {
        let mut cfg = small_cfg();
        cfg.trainer.input_pattern = vec![0.5; 4]; // input_width is 3
        assert!(Simulation::new(cfg).is_err());

        let mut cfg = small_cfg();
        cfg.tick_hz = 0;
        assert!(Simulation::new(cfg).is_err());
    }

    #[test]
    fn identical_seeds_stay_in_lockstep() {
        let cfg = small_cfg().with_seed(77);
        let mut a = Simulation::new(cfg.clone()).unwrap();
        let mut b = Simulation::new(cfg).unwrap();

        for _ in 0..600 {
            a.step();
            b.step();
        }

        assert_eq!(a.network().tick(), b.network().tick());
        assert_eq!(a.trainer().total_trials(), b.trainer().total_trials());
        assert_eq!(a.trainer().success_rate(), b.trainer().success_rate());
        for (ca, cb) in a
            .network()
            .connections()
            .iter()
            .zip(b.network().connections())
        {
            assert_eq!(ca.weight, cb.weight);
            assert_eq!(ca.eligibility_trace, cb.eligibility_trace);
        }
    }

    #[test]
    fn disabling_learning_freezes_weights_and_trials() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        sim.set_learning(false);
        let before: Vec<f32> = sim
            .network()
            .connections()
            .iter()
            .map(|c| c.weight)
            .collect();

        sim.stimulate_region("sensory", 1.0).unwrap();
        for _ in 0..100 {
            sim.step();
        }

        let after: Vec<f32> = sim
            .network()
            .connections()
            .iter()
            .map(|c| c.weight)
            .collect();
        assert_eq!(before, after);
        assert_eq!(sim.trainer().total_trials(), 0);
        // Activity dynamics keep running regardless.
        assert_eq!(sim.network().tick(), 100);
    }

    #[test]
    fn reset_pauses_and_reinitializes() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        sim.play();
        for _ in 0..50 {
            sim.step();
        }
        assert!(sim.network().tick() > 0);

        sim.reset();

        assert!(!sim.is_running());
        assert_eq!(sim.network().tick(), 0);
        assert_eq!(sim.trainer().total_trials(), 0);
        for n in sim.network().neurons() {
            assert_eq!(n.activity, 0.0);
            assert_eq!(n.potential, 0.0);
        }
    }

    #[test]
    fn control_calls_forward_to_the_network() {
        let mut sim = Simulation::new(small_cfg()).unwrap();
        assert!(sim.inject_input(&[1.0, 0.5]).is_ok());
        assert!(sim.inject_input(&[1.0; 9]).is_err());
        assert!(sim.stimulate_region("motor", 1.0).is_ok());
        assert!(sim.stimulate_region("nowhere", 1.0).is_err());
        assert!(sim.stimulate_neuron(0, 0.5).is_ok());
        assert!(sim.stimulate_neuron(usize::MAX, 0.5).is_err());
    }
}
