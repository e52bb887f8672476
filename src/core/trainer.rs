// no_std support: use core and alloc when std is not available
#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Where the trial loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrialPhase {
    /// Waiting for the next scheduled trial.
    Idle,
    /// A pattern was injected; activity is settling toward evaluation.
    Active,
}

/// Outcome of the most recently concluded trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrialResult {
    /// No trial has concluded yet.
    None,
    Success,
    Fail,
}

/// Reward-loop parameters. Tick counts are in trainer ticks, which advance
/// in lockstep with network ticks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainerConfig {
    /// Pattern injected at the start of every trial.
    pub input_pattern: Vec<f32>,
    /// Ticks between trial starts.
    pub trial_interval: u64,
    /// Ticks between injection and evaluation.
    pub settle_ticks: u64,
    /// The winning output must clear this floor for a success.
    pub success_threshold: f32,
    /// Reward broadcast on success.
    pub reward_success: f32,
    /// Reward broadcast on failure (negative: punishment).
    pub reward_fail: f32,
    /// Learning rate for the reward broadcast.
    pub reward_rate: f32,
    /// Learning rate handed to the per-tick Oja regularizer.
    pub regularizer_rate: f32,
    /// Per-tick eligibility trace decay handed to the network.
    pub trace_decay: f32,
    /// Trials counted by the rolling success rate.
    pub result_window: usize,
    /// Capacity of the success-rate and weight-change histories.
    pub history_cap: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            input_pattern: vec![1.0, 0.0, 1.0],
            trial_interval: 240,
            settle_ticks: 120,
            success_threshold: 0.08,
            reward_success: 1.5,
            reward_fail: -1.2,
            reward_rate: 0.08,
            regularizer_rate: 0.02,
            trace_decay: 0.1,
            result_window: 20,
            history_cap: 100,
        }
    }
}

impl TrainerConfig {
    /// Check parameter ranges. Returns the first violation found.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.input_pattern.is_empty() {
            return Err("input_pattern must not be empty");
        }
        if self.input_pattern.iter().any(|v| !v.is_finite()) {
            return Err("input_pattern values must be finite");
        }
        if self.trial_interval == 0 {
            return Err("trial_interval must be nonzero");
        }
        if self.settle_ticks == 0 || self.settle_ticks >= self.trial_interval {
            return Err("settle_ticks must be in [1, trial_interval)");
        }
        if !self.success_threshold.is_finite() || self.success_threshold <= 0.0 {
            return Err("success_threshold must be positive and finite");
        }
        if !self.reward_success.is_finite() || !self.reward_fail.is_finite() {
            return Err("reward magnitudes must be finite");
        }
        if !self.reward_rate.is_finite() || self.reward_rate < 0.0 {
            return Err("reward_rate must be nonnegative and finite");
        }
        if !self.regularizer_rate.is_finite() || self.regularizer_rate < 0.0 {
            return Err("regularizer_rate must be nonnegative and finite");
        }
        if !(self.trace_decay > 0.0 && self.trace_decay <= 1.0) {
            return Err("trace_decay must be in (0, 1]");
        }
        if self.result_window == 0 {
            return Err("result_window must be nonzero");
        }
        if self.history_cap == 0 {
            return Err("history_cap must be nonzero");
        }
        Ok(())
    }
}

/// Trial-based reward scheduler.
///
/// Every `trial_interval` ticks a fixed pattern is injected into the
/// network's input region; `settle_ticks` later the competing region's two
/// output halves are compared and a global reward is broadcast. One trial is
/// in flight at a time, and the network's own plasticity runs independently
/// in between; the trainer only adds the reward pulses on top.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainerConfig,
    tick: u64,
    phase: TrialPhase,
    trial_start: u64,
    total_trials: u64,
    out1: f32,
    out2: f32,
    last_result: TrialResult,
    results: Vec<bool>,
    success_history: Vec<f32>,
    weight_history: Vec<f32>,
}

impl Trainer {
    pub fn new(cfg: TrainerConfig) -> Result<Self, &'static str> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            tick: 0,
            phase: TrialPhase::Idle,
            trial_start: 0,
            total_trials: 0,
            out1: 0.0,
            out2: 0.0,
            last_result: TrialResult::None,
            results: Vec::new(),
            success_history: Vec::new(),
            weight_history: Vec::new(),
        })
    }

    /// Advance the trial loop by one tick, in lockstep with `Network::update`.
    ///
    /// A due evaluation concludes before a new trial may start, so a trial's
    /// reward always reflects its own settled outputs.
    pub fn tick(&mut self, net: &mut Network) {
        let (out1, out2) = net.competition_outputs();
        self.out1 = out1;
        self.out2 = out2;

        match self.phase {
            TrialPhase::Active => {
                if self.tick - self.trial_start >= self.cfg.settle_ticks {
                    self.conclude_trial(net);
                }
            }
            TrialPhase::Idle => {
                if self.tick % self.cfg.trial_interval == 0 {
                    self.begin_trial(net);
                }
            }
        }

        self.tick += 1;
    }

    fn begin_trial(&mut self, net: &mut Network) {
        // Pattern length is checked against the network when the simulation
        // is assembled, so the injection cannot be rejected here.
        let _ = net.inject_input(&self.cfg.input_pattern);
        self.trial_start = self.tick;
        self.total_trials += 1;
        self.phase = TrialPhase::Active;
    }

    /// Score the settled outputs, broadcast the reward, and record the trial.
    fn conclude_trial(&mut self, net: &mut Network) {
        let success = self.out1 > self.out2 && self.out1 > self.cfg.success_threshold;
        let reward = if success {
            self.cfg.reward_success
        } else {
            self.cfg.reward_fail
        };
        net.apply_global_reward(reward, self.cfg.reward_rate);

        self.results.push(success);
        if self.results.len() > self.cfg.result_window {
            let excess = self.results.len() - self.cfg.result_window;
            self.results.drain(..excess);
        }
        let rate = self.success_rate();
        push_history(&mut self.success_history, rate, self.cfg.history_cap);
        push_history(
            &mut self.weight_history,
            net.mean_last_weight_change(),
            self.cfg.history_cap,
        );

        self.last_result = if success {
            TrialResult::Success
        } else {
            TrialResult::Fail
        };
        self.phase = TrialPhase::Idle;
    }

    /// Clear all trial state and fully reinitialize the network.
    pub fn reset(&mut self, net: &mut Network) {
        net.reset();
        self.tick = 0;
        self.phase = TrialPhase::Idle;
        self.trial_start = 0;
        self.total_trials = 0;
        self.out1 = 0.0;
        self.out2 = 0.0;
        self.last_result = TrialResult::None;
        self.results.clear();
        self.success_history.clear();
        self.weight_history.clear();
    }

    /// Fraction of successes over the rolling result window; 0.0 before the
    /// first trial concludes.
    pub fn success_rate(&self) -> f32 {
        if self.results.is_empty() {
            return 0.0;
        }
        let successes = self.results.iter().filter(|&&r| r).count();
        successes as f32 / self.results.len() as f32
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn trial_active(&self) -> bool {
        self.phase == TrialPhase::Active
    }

    pub fn total_trials(&self) -> u64 {
        self.total_trials
    }

    pub fn last_result(&self) -> TrialResult {
        self.last_result
    }

    /// Competing-region outputs sampled at the most recent tick.
    pub fn outputs(&self) -> (f32, f32) {
        (self.out1, self.out2)
    }

    /// Per-trial outcomes inside the rolling window, oldest first.
    pub fn recent_results(&self) -> &[bool] {
        &self.results
    }

    /// Success rate after each concluded trial, capped at `history_cap`.
    pub fn success_history(&self) -> &[f32] {
        &self.success_history
    }

    /// Mean applied weight delta after each concluded trial, capped at
    /// `history_cap`.
    pub fn weight_history(&self) -> &[f32] {
        &self.weight_history
    }
}

/// Append to a rolling history, dropping the oldest entries past `cap`.
fn push_history(buf: &mut Vec<f32>, value: f32, cap: usize) {
    buf.push(value);
    if buf.len() > cap {
        let excess = buf.len() - cap;
        buf.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkConfig;

    fn small_net() -> Network {
        let mut cfg = NetworkConfig::default().with_neurons_per_region(4);
        cfg.input_width = 3;
        Network::new(cfg).unwrap()
    }

    fn fast_cfg(interval: u64, settle: u64) -> TrainerConfig {
        let mut cfg = TrainerConfig::default();
        cfg.trial_interval = interval;
        cfg.settle_ticks = settle;
        cfg
    }

    #[test]
    fn config_validation_catches_bad_cadence() {
        assert!(TrainerConfig::default().validate().is_ok());

        let mut cfg = TrainerConfig::default();
        cfg.settle_ticks = cfg.trial_interval;
        assert!(cfg.validate().is_err());

        let mut cfg = TrainerConfig::default();
        cfg.settle_ticks = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrainerConfig::default();
        cfg.input_pattern.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = TrainerConfig::default();
        cfg.trace_decay = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn trials_follow_the_configured_cadence() {
        let mut net = small_net();
        let mut trainer = Trainer::new(fast_cfg(10, 5)).unwrap();

        // Starts land on ticks 0, 10, 20, 30; each concludes five ticks in.
        for _ in 0..40 {
            trainer.tick(&mut net);
        }
        assert_eq!(trainer.total_trials(), 4);
        assert!(!trainer.trial_active());
        assert_ne!(trainer.last_result(), TrialResult::None);
        assert_eq!(trainer.success_history().len(), 4);
        assert_eq!(trainer.weight_history().len(), 4);
    }

    #[test]
    fn first_tick_begins_a_trial_and_injects_the_pattern() {
        let mut net = small_net();
        let mut trainer = Trainer::new(TrainerConfig::default()).unwrap();

        trainer.tick(&mut net);

        assert!(trainer.trial_active());
        assert_eq!(trainer.total_trials(), 1);
        let start = net.region("sensory").unwrap().members.start;
        assert_eq!(net.neurons()[start].potential, 1.0);
        assert_eq!(net.neurons()[start + 1].potential, 0.0);
        assert_eq!(net.neurons()[start + 2].potential, 1.0);
    }

    #[test]
    fn success_requires_margin_and_threshold() {
        let mut net = small_net();
        let mut trainer = Trainer::new(TrainerConfig::default()).unwrap();

        trainer.out1 = 0.5;
        trainer.out2 = 0.1;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.last_result(), TrialResult::Success);

        // Winning margin but below the output floor.
        trainer.out1 = 0.05;
        trainer.out2 = 0.01;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.last_result(), TrialResult::Fail);

        // Wrong winner.
        trainer.out1 = 0.2;
        trainer.out2 = 0.3;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.last_result(), TrialResult::Fail);

        // An exact tie is not a win.
        trainer.out1 = 0.5;
        trainer.out2 = 0.5;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.last_result(), TrialResult::Fail);
    }

    #[test]
    fn success_rate_tracks_the_rolling_window() {
        let mut net = small_net();
        let mut trainer = Trainer::new(TrainerConfig::default()).unwrap();
        assert_eq!(trainer.success_rate(), 0.0);

        trainer.out1 = 0.5;
        trainer.out2 = 0.1;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.success_rate(), 1.0);

        trainer.out1 = 0.0;
        trainer.out2 = 0.0;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.success_rate(), 0.5);
    }

    #[test]
    fn histories_and_results_stay_capped() {
        let mut net = small_net();
        let mut trainer = Trainer::new(fast_cfg(2, 1)).unwrap();

        for _ in 0..250 {
            trainer.tick(&mut net);
        }
        assert_eq!(trainer.total_trials(), 125);
        assert_eq!(trainer.recent_results().len(), trainer.config().result_window);
        assert_eq!(trainer.success_history().len(), trainer.config().history_cap);
        assert_eq!(trainer.weight_history().len(), trainer.config().history_cap);
    }

    #[test]
    fn reset_clears_trainer_and_network() {
        let mut net = small_net();
        let mut trainer = Trainer::new(fast_cfg(5, 2)).unwrap();
        for _ in 0..30 {
            net.update(1.0, true, 0.02, 0.1);
            trainer.tick(&mut net);
        }
        assert!(trainer.total_trials() > 0);
        assert!(net.tick() > 0);

        trainer.reset(&mut net);

        assert_eq!(trainer.total_trials(), 0);
        assert_eq!(trainer.phase(), TrialPhase::Idle);
        assert_eq!(trainer.last_result(), TrialResult::None);
        assert!(trainer.recent_results().is_empty());
        assert!(trainer.success_history().is_empty());
        assert!(trainer.weight_history().is_empty());
        assert_eq!(trainer.outputs(), (0.0, 0.0));
        assert_eq!(net.tick(), 0);
    }

    #[test]
    fn rewards_move_weights_when_traces_are_hot() {
        // Dense intra wiring guarantees edges between co-activated neurons.
        let mut cfg = NetworkConfig::default().with_neurons_per_region(4);
        cfg.input_width = 3;
        cfg.intra_region_prob = 1.0;
        let mut net = Network::new(cfg).unwrap();
        let mut trainer = Trainer::new(TrainerConfig::default()).unwrap();

        // Build up traces with direct co-activation, then force a success.
        for _ in 0..3 {
            net.stimulate_region("motor", 1.0).unwrap();
            net.stimulate_region("sensory", 1.0).unwrap();
            net.update(1.0, true, 0.02, 0.1);
        }
        let hot = net
            .connections()
            .iter()
            .any(|c| c.eligibility_trace > 0.01);
        assert!(hot);

        trainer.out1 = 0.9;
        trainer.out2 = 0.1;
        trainer.conclude_trial(&mut net);
        assert_eq!(trainer.last_result(), TrialResult::Success);
        assert_eq!(trainer.weight_history().len(), 1);
        // Positive reward over nonnegative traces: mean delta must be positive.
        assert!(trainer.weight_history()[0] > 0.0);
    }
}
