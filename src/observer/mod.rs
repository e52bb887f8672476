use core::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{NetStats, Pulse, WeightStats};
use crate::sim::Simulation;
use crate::trainer::{TrialPhase, TrialResult};

/// A read-only snapshot of what the simulation is doing.
///
/// Design intent:
/// - Observers cannot mutate or steer the simulation.
/// - Snapshotting is *on-demand* and can allocate; the tick loop stays
///   unchanged.
/// - One snapshot carries everything a renderer or dashboard needs:
///   geometry, per-entity dynamic state, and the learning ledger.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimSnapshot {
    pub tick: u64,
    pub running: bool,
    pub learning_enabled: bool,
    pub speed: f32,
    pub neurons: Vec<NeuronView>,
    pub connections: Vec<ConnectionView>,
    pub regions: Vec<RegionView>,
    pub hub_readout: Vec<f32>,
    pub stats: NetStats,
    pub weights: WeightStats,
    pub trainer: TrainerView,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub region: usize,
    pub potential: f32,
    pub activity: f32,
    pub refractory: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionView {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
    pub activity: f32,
    pub eligibility_trace: f32,
    pub last_weight_change: f32,
    pub pulses: Vec<Pulse>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionView {
    pub id: String,
    pub name: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub total_activity: f32,
    pub members: Range<usize>,
}

/// The learning ledger: trial phase, outcome tallies, rolling histories.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrainerView {
    pub phase: TrialPhase,
    pub last_result: TrialResult,
    pub total_trials: u64,
    pub success_rate: f32,
    pub out1: f32,
    pub out2: f32,
    pub input_pattern: Vec<f32>,
    pub recent_results: Vec<bool>,
    pub success_history: Vec<f32>,
    pub weight_history: Vec<f32>,
}

impl SimSnapshot {
    pub fn capture(sim: &Simulation) -> Self {
        let net = sim.network();
        let trainer = sim.trainer();
        let (out1, out2) = trainer.outputs();

        Self {
            tick: net.tick(),
            running: sim.is_running(),
            learning_enabled: sim.learning_enabled(),
            speed: sim.speed(),
            neurons: net
                .neurons()
                .iter()
                .map(|n| NeuronView {
                    x: n.x,
                    y: n.y,
                    radius: n.radius,
                    region: n.region,
                    potential: n.potential,
                    activity: n.activity,
                    refractory: n.refractory,
                })
                .collect(),
            connections: net
                .connections()
                .iter()
                .map(|c| ConnectionView {
                    source: c.source,
                    target: c.target,
                    weight: c.weight,
                    activity: c.activity,
                    eligibility_trace: c.eligibility_trace,
                    last_weight_change: c.last_weight_change,
                    pulses: c.pulses().to_vec(),
                })
                .collect(),
            regions: net
                .regions()
                .iter()
                .map(|r| RegionView {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    color: r.color.clone(),
                    x: r.x,
                    y: r.y,
                    radius: r.radius,
                    total_activity: r.total_activity,
                    members: r.members.clone(),
                })
                .collect(),
            hub_readout: net.hub_readout().to_vec(),
            stats: *net.stats(),
            weights: net.weight_stats(),
            trainer: TrainerView {
                phase: trainer.phase(),
                last_result: trainer.last_result(),
                total_trials: trainer.total_trials(),
                success_rate: trainer.success_rate(),
                out1,
                out2,
                input_pattern: trainer.config().input_pattern.clone(),
                recent_results: trainer.recent_results().to_vec(),
                success_history: trainer.success_history().to_vec(),
                weight_history: trainer.weight_history().to_vec(),
            },
        }
    }
}

pub struct SimAdapter<'a> {
    sim: &'a Simulation,
}

impl<'a> SimAdapter<'a> {
    pub fn new(sim: &'a Simulation) -> Self {
        Self { sim }
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot::capture(self.sim)
    }

    pub fn success_rate(&self) -> f32 {
        self.sim.trainer().success_rate()
    }

    /// Mean activity of one region, by id. `None` for unknown ids.
    pub fn region_activity(&self, id: &str) -> Option<f32> {
        self.sim.network().region(id).map(|r| r.total_activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HUB_ID;
    use crate::sim::SimConfig;

    fn small_sim() -> Simulation {
        let mut cfg = SimConfig::default();
        cfg.network = cfg.network.with_neurons_per_region(6);
        cfg.network.input_width = 3;
        Simulation::new(cfg).unwrap()
    }

    #[test]
    fn snapshot_mirrors_live_state() {
        let mut sim = small_sim();
        sim.stimulate_region("sensory", 1.0).unwrap();
        for _ in 0..10 {
            sim.step();
        }

        let snap = SimSnapshot::capture(&sim);
        assert_eq!(snap.tick, sim.network().tick());
        assert_eq!(snap.neurons.len(), sim.network().neuron_count());
        assert_eq!(snap.connections.len(), sim.network().connection_count());
        assert_eq!(snap.regions.len(), sim.network().regions().len());
        assert_eq!(snap.regions.last().unwrap().id, HUB_ID);
        assert_eq!(snap.hub_readout.len(), sim.network().config().readout_size);
        assert_eq!(snap.trainer.total_trials, sim.trainer().total_trials());
        assert_eq!(snap.trainer.input_pattern, sim.trainer().config().input_pattern);

        for (view, neuron) in snap.neurons.iter().zip(sim.network().neurons()) {
            assert_eq!(view.activity, neuron.activity);
            assert_eq!(view.region, neuron.region);
        }
    }

    #[test]
    fn snapshot_is_detached_from_later_ticks() {
        let mut sim = small_sim();
        for _ in 0..5 {
            sim.step();
        }
        let snap = SimSnapshot::capture(&sim);
        for _ in 0..5 {
            sim.step();
        }
        assert_eq!(snap.tick, 5);
        assert_eq!(sim.network().tick(), 10);
    }

    #[test]
    fn adapter_and_capture_agree() {
        let mut sim = small_sim();
        for _ in 0..20 {
            sim.step();
        }
        let adapter = SimAdapter::new(&sim);
        assert_eq!(adapter.snapshot(), SimSnapshot::capture(&sim));
        assert_eq!(adapter.success_rate(), sim.trainer().success_rate());
        assert!(adapter.region_activity("motor").is_some());
        assert!(adapter.region_activity(HUB_ID).is_some());
        assert!(adapter.region_activity("nowhere").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_round_trips_through_json() {
        let mut sim = small_sim();
        sim.play();
        for _ in 0..30 {
            sim.step();
        }

        let snap = SimSnapshot::capture(&sim);
        let json = serde_json::to_string(&snap).unwrap();
        let back: SimSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
