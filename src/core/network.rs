// no_std support: use core and alloc when std is not available
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(not(feature = "std"))]
use alloc::{string::String, string::ToString, vec, vec::Vec};
#[cfg(not(feature = "std"))]
use hashbrown::HashMap;

use core::mem;
use core::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prng::Prng;

/// Index of a neuron in the network's flat arena.
pub type NeuronId = usize;

/// Type alias for synaptic weights (range: `-weight_clamp` to `weight_clamp`).
pub type Weight = f32;

/// Type alias for visible firing strength (range: 0.0 to 1.0).
pub type Activity = f32;

/// Region id of the central hub.
pub const HUB_ID: &str = "hub";

/// How many neurons a region-level stimulation pokes at random.
const STIMULATE_COUNT: usize = 5;

/// Edge activity bump applied when a pulse is launched.
const EDGE_ACTIVITY_BUMP: f32 = 0.3;

/// Neurons scatter inside this fraction of the region disc.
const REGION_SCATTER: f32 = 0.85;
const HUB_SCATTER: f32 = 0.8;

/// Render-only per-neuron dot size band.
const NEURON_RADIUS_MIN: f32 = 2.0;
const NEURON_RADIUS_MAX: f32 = 4.0;

// Hub readout modulation: per-region gains drift toward this mean activity.
const MODULATION_TARGET: f32 = 0.5;
const MODULATION_RATE: f32 = 0.01;
const MODULATION_MIN: f32 = 0.1;
const MODULATION_MAX: f32 = 2.0;

/// Render-space rectangle the region layout is projected into.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x: 100.0,
            y: 50.0,
            width: 600.0,
            height: 500.0,
        }
    }
}

/// Construction-time description of one region.
///
/// `position` and `size` are relative to the network bounds; `color` is a
/// render-only hex string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionSpec {
    pub id: String,
    pub name: String,
    pub color: String,
    pub position: (f32, f32),
    pub size: f32,
    pub neuron_count: usize,
}

impl RegionSpec {
    pub fn new(
        id: &str,
        name: &str,
        color: &str,
        position: (f32, f32),
        size: f32,
        neuron_count: usize,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            position,
            size,
            neuron_count,
        }
    }
}

/// The stock six-region layout.
pub fn default_regions() -> Vec<RegionSpec> {
    vec![
        RegionSpec::new("frontal", "Frontal", "#00ffff", (0.25, 0.25), 0.18, 60),
        RegionSpec::new("parietal", "Parietal", "#4488ff", (0.65, 0.20), 0.16, 60),
        RegionSpec::new("temporal", "Temporal", "#00ff88", (0.40, 0.65), 0.15, 60),
        RegionSpec::new("occipital", "Occipital", "#ff00ff", (0.80, 0.45), 0.14, 60),
        RegionSpec::new("motor", "Motor", "#ffff00", (0.20, 0.45), 0.12, 60),
        RegionSpec::new("sensory", "Sensory", "#ff8844", (0.45, 0.40), 0.14, 60),
    ]
}

/// Network construction and dynamics parameters.
///
/// All rates are per-tick fractions at speed 1.0; the tick `speed` factor
/// multiplies them uniformly, which scales how fast the dynamics play out
/// without moving their fixed points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Regions to build, in order. Order matters for inter-region wiring:
    /// sparse edges run from earlier regions to later ones.
    pub regions: Vec<RegionSpec>,
    /// Number of neurons in the central hub.
    pub hub_neurons: usize,
    /// Hub placement, relative to `bounds` like a region's.
    pub hub_position: (f32, f32),
    pub hub_size: f32,
    /// Length of the hub's normalized readout vector.
    pub readout_size: usize,
    /// Render-space rectangle; positions are derived from it once, at build.
    pub bounds: Bounds,
    /// Probability of a directed edge between two neurons of the same region.
    pub intra_region_prob: f32,
    /// Probability of a directed edge from an earlier region's neuron to a
    /// later region's neuron.
    pub inter_region_prob: f32,
    /// Per-neuron, per-direction probability of a region<->hub edge.
    pub hub_link_prob: f32,
    /// Probability of a directed edge between two hub neurons.
    pub hub_internal_prob: f32,
    /// Potential level at which a non-refractory neuron fires.
    pub fire_threshold: f32,
    /// Ticks of suppressed firing after a fire.
    pub refractory_ticks: u32,
    /// Per-tick fraction removed from potential and activity.
    pub decay_rate: f32,
    /// Per-tick fraction removed from a connection's visible activity.
    pub edge_activity_decay: f32,
    /// Fraction of an edge a pulse advances per tick at speed 1.0.
    pub pulse_speed: f32,
    /// Fresh weights are drawn uniformly from `[weight_init_min, weight_init_max)`.
    pub weight_init_min: f32,
    pub weight_init_max: f32,
    /// Weights stay within `[-weight_clamp, weight_clamp]` after every update.
    pub weight_clamp: f32,
    /// Region that receives injected input patterns.
    pub input_region: String,
    /// Maximum input pattern length; patterns map onto the first neurons of
    /// the input region.
    pub input_width: usize,
    /// Region whose two index halves compete under lateral inhibition.
    pub competing_region: String,
    /// Losing-half suppression per unit of activity gap.
    pub inhibition_strength: f32,
    /// Lower bound on the suppression factor.
    pub inhibition_floor: f32,
    /// Activity above this counts a neuron as "active" in the stats block.
    pub active_threshold: f32,
    /// Ticks per rolling stats second (the external driver's tick rate).
    pub stats_window: u32,
    /// PRNG seed for topology, weight draws, and stimulation picks.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            hub_neurons: 20,
            hub_position: (0.45, 0.45),
            hub_size: 0.08,
            readout_size: 4,
            bounds: Bounds::default(),
            intra_region_prob: 0.15,
            inter_region_prob: 0.05,
            hub_link_prob: 0.3,
            hub_internal_prob: 0.3,
            fire_threshold: 0.5,
            refractory_ticks: 5,
            decay_rate: 0.05,
            edge_activity_decay: 0.05,
            pulse_speed: 0.02,
            weight_init_min: 0.2,
            weight_init_max: 0.6,
            weight_clamp: 2.0,
            input_region: "sensory".to_string(),
            input_width: 10,
            competing_region: "motor".to_string(),
            inhibition_strength: 0.6,
            inhibition_floor: 0.25,
            active_threshold: 0.1,
            stats_window: 60,
            seed: 42,
        }
    }
}

impl NetworkConfig {
    /// Check parameter ranges. Returns the first violation found.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.regions.is_empty() {
            return Err("regions must not be empty");
        }
        for (i, spec) in self.regions.iter().enumerate() {
            if spec.id.is_empty() {
                return Err("region id must not be empty");
            }
            if spec.id == HUB_ID {
                return Err("region id 'hub' is reserved");
            }
            if spec.neuron_count == 0 {
                return Err("region neuron_count must be nonzero");
            }
            if self.regions[..i].iter().any(|other| other.id == spec.id) {
                return Err("region ids must be unique");
            }
        }
        if self.hub_neurons == 0 {
            return Err("hub_neurons must be nonzero");
        }
        if self.readout_size == 0 {
            return Err("readout_size must be nonzero");
        }
        if !(self.bounds.width > 0.0) || !(self.bounds.height > 0.0) {
            return Err("bounds must have positive width and height");
        }
        for p in [
            self.intra_region_prob,
            self.inter_region_prob,
            self.hub_link_prob,
            self.hub_internal_prob,
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err("connection probabilities must be in [0, 1]");
            }
        }
        if !self.fire_threshold.is_finite() || self.fire_threshold <= 0.0 {
            return Err("fire_threshold must be positive and finite");
        }
        if !(self.decay_rate > 0.0 && self.decay_rate < 1.0) {
            return Err("decay_rate must be in (0, 1)");
        }
        if !(self.edge_activity_decay > 0.0 && self.edge_activity_decay < 1.0) {
            return Err("edge_activity_decay must be in (0, 1)");
        }
        if !(self.pulse_speed > 0.0 && self.pulse_speed <= 1.0) {
            return Err("pulse_speed must be in (0, 1]");
        }
        if !self.weight_init_min.is_finite()
            || !self.weight_init_max.is_finite()
            || self.weight_init_min >= self.weight_init_max
        {
            return Err("weight init band must be a finite nonempty range");
        }
        if !(self.weight_clamp > 0.0) || !self.weight_clamp.is_finite() {
            return Err("weight_clamp must be positive and finite");
        }
        if self.weight_init_min < -self.weight_clamp || self.weight_init_max > self.weight_clamp {
            return Err("weight init band must lie within the clamp band");
        }
        if self.input_width == 0 {
            return Err("input_width must be nonzero");
        }
        let input = self
            .regions
            .iter()
            .find(|spec| spec.id == self.input_region)
            .ok_or("input_region does not name a configured region")?;
        if self.input_width > input.neuron_count {
            return Err("input_width exceeds the input region's neuron count");
        }
        let competing = self
            .regions
            .iter()
            .find(|spec| spec.id == self.competing_region)
            .ok_or("competing_region does not name a configured region")?;
        if competing.neuron_count < 2 {
            return Err("competing_region needs at least two neurons");
        }
        if !self.inhibition_strength.is_finite() || self.inhibition_strength < 0.0 {
            return Err("inhibition_strength must be nonnegative and finite");
        }
        if !(self.inhibition_floor > 0.0 && self.inhibition_floor <= 1.0) {
            return Err("inhibition_floor must be in (0, 1]");
        }
        if !(0.0..1.0).contains(&self.active_threshold) {
            return Err("active_threshold must be in [0, 1)");
        }
        if self.stats_window == 0 {
            return Err("stats_window must be nonzero");
        }
        Ok(())
    }

    /// Set the PRNG seed (builder style).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Resize every configured region to `count` neurons (builder style).
    pub fn with_neurons_per_region(mut self, count: usize) -> Self {
        for spec in &mut self.regions {
            spec.neuron_count = count;
        }
        self
    }
}

/// A single neuron. Position and radius are render-only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neuron {
    /// Internal accumulator driving firing. Decays toward zero.
    pub potential: f32,
    /// Visible firing strength in [0, 1]. Decays toward zero.
    pub activity: Activity,
    /// Ticks of suppressed firing remaining.
    pub refractory: u32,
    /// Index of the owning region (immutable after construction).
    pub region: usize,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// A signal in flight along a connection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pulse {
    /// Fraction of the edge traveled, in [0, 1).
    pub progress: f32,
    /// Source activity at launch; scaled by the weight on arrival.
    pub strength: f32,
}

/// A directed weighted edge between two neurons.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: Weight,
    /// Decaying memory of recent source/target co-activity; multiplied by
    /// the global reward to assign credit.
    pub eligibility_trace: f32,
    /// Visible "how busy was this edge recently", in [0, 1].
    pub activity: f32,
    /// Signed delta applied by the most recent weight update.
    pub last_weight_change: f32,
    pulses: Vec<Pulse>,
}

impl Connection {
    fn new(source: NeuronId, target: NeuronId, weight: Weight) -> Self {
        Self {
            source,
            target,
            weight,
            eligibility_trace: 0.0,
            activity: 0.0,
            last_weight_change: 0.0,
            pulses: Vec::new(),
        }
    }

    /// Signals currently traveling along this edge.
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    pub fn pulse_in_flight(&self) -> bool {
        !self.pulses.is_empty()
    }
}

/// A named group of neurons. The hub is the last region and has id `hub`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Member neuron ids; always a contiguous arena range.
    pub members: Range<NeuronId>,
    /// Absolute render-space center and radius.
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Mean member activity, recomputed every tick.
    pub total_activity: f32,
}

/// Rolling network-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetStats {
    /// Pulses launched since construction or the last reset.
    pub total_signals: u64,
    /// Pulses launched within the last rolling second.
    pub signals_this_second: u32,
    /// Fires within the last rolling second, per neuron.
    pub firing_rate: f32,
    /// Neurons with activity above `active_threshold` right now.
    pub active_neurons: usize,
}

/// Partition of connections by the sign of their last weight change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightStats {
    pub strengthened: usize,
    pub weakened: usize,
}

/// The full simulation substrate: regions, hub, neurons, connections.
///
/// One `Network` is owned by one logical thread of control; every mutation
/// goes through `update` or an explicit control call. Topology is fixed at
/// construction; only weights and transient state change afterwards.
#[derive(Debug, Clone)]
pub struct Network {
    cfg: NetworkConfig,
    rng: Prng,
    neurons: Vec<Neuron>,
    connections: Vec<Connection>,
    regions: Vec<Region>,
    region_index: HashMap<String, usize>,
    hub_index: usize,
    input_region_index: usize,
    competing_region_index: usize,
    /// Weighted pulse arrivals to fold into potentials next tick.
    pending_input: Vec<f32>,
    /// Which neurons fired during the current tick's integration.
    fired: Vec<bool>,
    /// Hub readout vector, normalized to [0, 1].
    readout: Vec<f32>,
    /// Per-region readout gains, drifting homeostatically.
    modulation: Vec<f32>,
    stats: NetStats,
    signal_window: Vec<u32>,
    fire_window: Vec<u32>,
    tick: u64,
}

impl Network {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    pub fn new(cfg: NetworkConfig) -> Result<Self, &'static str> {
        cfg.validate()?;

        let mut rng = Prng::new(cfg.seed);
        let mut neurons = Vec::new();
        let mut regions: Vec<Region> = Vec::with_capacity(cfg.regions.len() + 1);
        let mut region_index = HashMap::new();

        for spec in &cfg.regions {
            let region = place_region(
                &mut rng,
                &mut neurons,
                regions.len(),
                &cfg.bounds,
                spec,
                REGION_SCATTER,
            );
            region_index.insert(region.id.clone(), regions.len());
            regions.push(region);
        }

        let hub_spec = RegionSpec::new(
            HUB_ID,
            "Hub",
            "#ffffff",
            cfg.hub_position,
            cfg.hub_size,
            cfg.hub_neurons,
        );
        let hub = place_region(
            &mut rng,
            &mut neurons,
            regions.len(),
            &cfg.bounds,
            &hub_spec,
            HUB_SCATTER,
        );
        let hub_index = regions.len();
        region_index.insert(hub.id.clone(), hub_index);
        regions.push(hub);

        let connections = wire_topology(&cfg, &regions, hub_index, &mut rng);

        let neuron_count = neurons.len();
        let region_count = regions.len();
        let input_region_index = region_index[&cfg.input_region];
        let competing_region_index = region_index[&cfg.competing_region];

        let readout = vec![0.0; cfg.readout_size];
        let modulation = vec![1.0; region_count];
        let pending_input = vec![0.0; neuron_count];
        let fired = vec![false; neuron_count];

        Ok(Self {
            cfg,
            rng,
            neurons,
            connections,
            regions,
            region_index,
            hub_index,
            input_region_index,
            competing_region_index,
            pending_input,
            fired,
            readout,
            modulation,
            stats: NetStats::default(),
            signal_window: Vec::new(),
            fire_window: Vec::new(),
            tick: 0,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tick update
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance the simulation by one logical tick.
    ///
    /// `speed` multiplies every per-tick rate (decays, pulse step, trace and
    /// regularizer rates), scaling the visible dynamics without moving their
    /// fixed points. A non-positive or non-finite `speed` is a no-op.
    ///
    /// `learning_enabled` gates the plasticity steps (eligibility traces and
    /// the Oja regularizer); within an enabled tick, the regularizer runs
    /// unconditionally, independent of any reward.
    ///
    /// Step order is fixed: integration, propagation, traces, regularizer,
    /// lateral inhibition, aggregation, stats. The order is load-bearing;
    /// traces must see this tick's activity before any reward lands, and
    /// inhibition must run before activity is aggregated or read out.
    pub fn update(
        &mut self,
        speed: f32,
        learning_enabled: bool,
        regularizer_rate: f32,
        trace_decay_rate: f32,
    ) {
        if !(speed > 0.0) || !speed.is_finite() {
            return;
        }

        let fires = self.integrate_neurons(speed);
        let launches = self.propagate_signals(speed);
        if learning_enabled {
            self.update_traces(speed, trace_decay_rate);
            self.apply_regularizer(speed, regularizer_rate);
        }
        self.apply_inhibition();
        self.refresh_aggregates();
        self.refresh_stats(fires, launches);
        self.tick += 1;
    }

    /// Step 1: fold pending arrivals into potentials, decay, and fire.
    fn integrate_neurons(&mut self, speed: f32) -> u32 {
        let decay = (self.cfg.decay_rate * speed).min(1.0);
        let threshold = self.cfg.fire_threshold;
        let cooldown = self.cfg.refractory_ticks;
        let mut fires = 0u32;

        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            // Arrivals were refractory-gated at delivery time.
            neuron.potential += mem::take(&mut self.pending_input[i]);

            let mut fired = false;
            if neuron.refractory > 0 {
                // Counting down suppresses firing this tick regardless of
                // potential; the earliest re-fire is one tick after zero.
                neuron.refractory -= 1;
            } else if neuron.potential >= threshold {
                fired = true;
                fires += 1;
                neuron.potential = 0.0;
                neuron.refractory = cooldown;
            }

            neuron.potential *= 1.0 - decay;
            neuron.activity *= 1.0 - decay;
            if fired {
                neuron.activity = 1.0;
            }
            neuron.activity = neuron.activity.clamp(0.0, 1.0);
            self.fired[i] = fired;
        }

        fires
    }

    /// Step 2: advance in-flight pulses, deliver arrivals, launch new pulses.
    ///
    /// A pulse launched this tick first moves on the next one, so delivery
    /// latency is `ceil(1 / (pulse_speed * speed))` ticks after the fire.
    fn propagate_signals(&mut self, speed: f32) -> u32 {
        let step = self.cfg.pulse_speed * speed;
        let edge_decay = (self.cfg.edge_activity_decay * speed).min(1.0);
        let mut launches = 0u32;

        for conn in self.connections.iter_mut() {
            let mut k = 0;
            while k < conn.pulses.len() {
                conn.pulses[k].progress += step;
                if conn.pulses[k].progress >= 1.0 {
                    let pulse = conn.pulses.swap_remove(k);
                    // Refractory targets ignore arrivals.
                    if self.neurons[conn.target].refractory == 0 {
                        self.pending_input[conn.target] += pulse.strength * conn.weight;
                    }
                } else {
                    k += 1;
                }
            }

            conn.activity *= 1.0 - edge_decay;

            if self.fired[conn.source] {
                conn.pulses.push(Pulse {
                    progress: 0.0,
                    strength: self.neurons[conn.source].activity,
                });
                conn.activity = (conn.activity + EDGE_ACTIVITY_BUMP).min(1.0);
                launches += 1;
            }
        }

        launches
    }

    /// Step 3: decay-then-accumulate the per-connection eligibility traces.
    fn update_traces(&mut self, speed: f32, trace_decay_rate: f32) {
        let keep = 1.0 - (trace_decay_rate * speed).min(1.0);
        for conn in self.connections.iter_mut() {
            let pre = self.neurons[conn.source].activity;
            let post = self.neurons[conn.target].activity;
            conn.eligibility_trace = conn.eligibility_trace * keep + pre * post * speed;
        }
    }

    /// Step 4: Oja's rule, the reward-independent stability regularizer.
    ///
    /// `dw = rate * post * (pre - post * w)`; the updated weight is clamped
    /// to `±weight_clamp`.
    fn apply_regularizer(&mut self, speed: f32, regularizer_rate: f32) {
        let lr = regularizer_rate * speed;
        let clamp = self.cfg.weight_clamp;
        for conn in self.connections.iter_mut() {
            let pre = self.neurons[conn.source].activity;
            let post = self.neurons[conn.target].activity;
            let dw = lr * post * (pre - post * conn.weight);
            let next = (conn.weight + dw).clamp(-clamp, clamp);
            conn.last_weight_change = next - conn.weight;
            conn.weight = next;
        }
    }

    /// Step 5: winner-take-all lateral inhibition over the competing region.
    ///
    /// The region's index halves (floor midpoint) compete: the half with the
    /// lower mean activity is multiplied by
    /// `max(1 - inhibition_strength * gap, inhibition_floor)`, where `gap` is
    /// the difference of the half means. Monotonic in the gap, no-op on ties.
    fn apply_inhibition(&mut self) {
        let members = self.regions[self.competing_region_index].members.clone();
        let mid = members.start + members.len() / 2;
        let first = mean_activity(&self.neurons[members.start..mid]);
        let second = mean_activity(&self.neurons[mid..members.end]);
        if first == second {
            return;
        }

        let (losers, gap) = if first > second {
            (mid..members.end, first - second)
        } else {
            (members.start..mid, second - first)
        };
        let factor = (1.0 - self.cfg.inhibition_strength * gap).max(self.cfg.inhibition_floor);
        for neuron in &mut self.neurons[losers] {
            neuron.activity *= factor;
        }
    }

    /// Step 6: refresh per-region means, the hub readout, and its gains.
    fn refresh_aggregates(&mut self) {
        for region in self.regions.iter_mut() {
            region.total_activity = mean_activity(&self.neurons[region.members.clone()]);
        }

        for v in self.readout.iter_mut() {
            *v = 0.0;
        }
        let size = self.readout.len();
        for (i, region) in self.regions[..self.hub_index].iter().enumerate() {
            self.readout[i % size] += region.total_activity * self.modulation[i];
        }
        let mut max_val = 0.0f32;
        for &v in self.readout.iter() {
            max_val = max_val.max(v);
        }
        if max_val > 0.0 {
            let denom = max_val.max(1.0);
            for v in self.readout.iter_mut() {
                *v = (*v / denom).min(1.0);
            }
        }

        for (i, region) in self.regions[..self.hub_index].iter().enumerate() {
            let drift = (MODULATION_TARGET - region.total_activity) * MODULATION_RATE;
            self.modulation[i] = (self.modulation[i] + drift).clamp(MODULATION_MIN, MODULATION_MAX);
        }
    }

    /// Step 7: rolling one-second windows and instantaneous counters.
    fn refresh_stats(&mut self, fires: u32, launches: u32) {
        let window = self.cfg.stats_window as usize;
        push_window(&mut self.signal_window, launches, window);
        push_window(&mut self.fire_window, fires, window);

        self.stats.total_signals += launches as u64;
        self.stats.signals_this_second = self.signal_window.iter().sum();
        let window_fires: u32 = self.fire_window.iter().sum();
        self.stats.firing_rate = window_fires as f32 / self.neurons.len() as f32;
        let threshold = self.cfg.active_threshold;
        self.stats.active_neurons = self
            .neurons
            .iter()
            .filter(|n| n.activity > threshold)
            .count();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs and rewards
    // ─────────────────────────────────────────────────────────────────────────

    /// Write an input pattern onto the first `pattern.len()` neurons of the
    /// input region: potential is raised by each value, and nonzero entries
    /// lift activity so the injection is immediately visible. A unit entry
    /// crosses the fire threshold on the next integration step.
    ///
    /// Rejected without touching any state: empty patterns, patterns longer
    /// than `input_width`, non-finite values.
    pub fn inject_input(&mut self, pattern: &[f32]) -> Result<(), &'static str> {
        if pattern.is_empty() {
            return Err("input pattern must not be empty");
        }
        if pattern.len() > self.cfg.input_width {
            return Err("input pattern is longer than input_width");
        }
        if pattern.iter().any(|v| !v.is_finite()) {
            return Err("input pattern values must be finite");
        }

        let start = self.regions[self.input_region_index].members.start;
        for (i, &value) in pattern.iter().enumerate() {
            let neuron = &mut self.neurons[start + i];
            neuron.potential += value;
            if value > 0.0 {
                neuron.activity = neuron.activity.max(value.min(1.0));
            }
        }
        Ok(())
    }

    /// Broadcast a global scalar reward: every connection's weight moves by
    /// `rate * reward * eligibility_trace`, clamped, and `last_weight_change`
    /// is overwritten with the applied delta (superseding the tick's
    /// regularizer delta). Traces are left untouched; only the per-tick
    /// trace decay erodes them.
    pub fn apply_global_reward(&mut self, reward: f32, rate: f32) {
        if !reward.is_finite() || !rate.is_finite() {
            return;
        }
        let clamp = self.cfg.weight_clamp;
        for conn in self.connections.iter_mut() {
            let dw = rate * reward * conn.eligibility_trace;
            let next = (conn.weight + dw).clamp(-clamp, clamp);
            conn.last_weight_change = next - conn.weight;
            conn.weight = next;
        }
    }

    /// Poke up to five random neurons of a region with extra potential,
    /// outside the learning loop.
    pub fn stimulate_region(&mut self, id: &str, strength: f32) -> Result<(), &'static str> {
        if !strength.is_finite() {
            return Err("stimulation strength must be finite");
        }
        let region_idx = match self.region_index.get(id) {
            Some(&i) => i,
            None => return Err("unknown region id"),
        };
        let members = self.regions[region_idx].members.clone();
        let picks = self
            .rng
            .pick_distinct(members.len(), STIMULATE_COUNT.min(members.len()));
        for p in picks {
            self.neurons[members.start + p].potential += strength;
        }
        Ok(())
    }

    /// Poke one neuron with extra potential.
    pub fn stimulate_neuron(&mut self, id: NeuronId, strength: f32) -> Result<(), &'static str> {
        if !strength.is_finite() {
            return Err("stimulation strength must be finite");
        }
        match self.neurons.get_mut(id) {
            Some(neuron) => {
                neuron.potential += strength;
                Ok(())
            }
            None => Err("neuron id out of range"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resets
    // ─────────────────────────────────────────────────────────────────────────

    /// Redraw every weight from the init band and clear all per-connection
    /// learning and transit state. Topology is untouched.
    pub fn reset_weights(&mut self) {
        let (lo, hi) = (self.cfg.weight_init_min, self.cfg.weight_init_max);
        for conn in self.connections.iter_mut() {
            conn.weight = self.rng.gen_range_f32(lo, hi);
            conn.eligibility_trace = 0.0;
            conn.activity = 0.0;
            conn.last_weight_change = 0.0;
            conn.pulses.clear();
        }
    }

    /// Full reinitialization: weights redrawn, every neuron zeroed, stats and
    /// tick counter cleared. Topology and neuron positions are preserved, and
    /// the PRNG stream continues (it is not reseeded).
    pub fn reset(&mut self) {
        self.reset_weights();
        for neuron in self.neurons.iter_mut() {
            neuron.potential = 0.0;
            neuron.activity = 0.0;
            neuron.refractory = 0;
        }
        for v in self.pending_input.iter_mut() {
            *v = 0.0;
        }
        for f in self.fired.iter_mut() {
            *f = false;
        }
        for region in self.regions.iter_mut() {
            region.total_activity = 0.0;
        }
        for v in self.readout.iter_mut() {
            *v = 0.0;
        }
        for m in self.modulation.iter_mut() {
            *m = 1.0;
        }
        self.stats = NetStats::default();
        self.signal_window.clear();
        self.fire_window.clear();
        self.tick = 0;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// All regions, hub last.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.region_index.get(id).map(|&i| &self.regions[i])
    }

    pub fn hub(&self) -> &Region {
        &self.regions[self.hub_index]
    }

    /// The hub's normalized readout vector.
    pub fn hub_readout(&self) -> &[f32] {
        &self.readout
    }

    pub fn stats(&self) -> &NetStats {
        &self.stats
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.cfg
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Mean activity of the competing region's first and second index halves
    /// (floor midpoint), read after inhibition.
    pub fn competition_outputs(&self) -> (f32, f32) {
        let members = self.regions[self.competing_region_index].members.clone();
        let mid = members.start + members.len() / 2;
        (
            mean_activity(&self.neurons[members.start..mid]),
            mean_activity(&self.neurons[mid..members.end]),
        )
    }

    /// Mean of all connections' `last_weight_change`.
    pub fn mean_last_weight_change(&self) -> f32 {
        if self.connections.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.connections.iter().map(|c| c.last_weight_change).sum();
        sum / self.connections.len() as f32
    }

    /// Count connections by the sign of their last weight change. A zero
    /// delta counts as weakened, so the two counts always partition the full
    /// connection set.
    pub fn weight_stats(&self) -> WeightStats {
        let strengthened = self
            .connections
            .iter()
            .filter(|c| c.last_weight_change > 0.0)
            .count();
        WeightStats {
            strengthened,
            weakened: self.connections.len() - strengthened,
        }
    }
}

fn mean_activity(neurons: &[Neuron]) -> f32 {
    if neurons.is_empty() {
        return 0.0;
    }
    let sum: f32 = neurons.iter().map(|n| n.activity).sum();
    sum / neurons.len() as f32
}

fn push_window(window: &mut Vec<u32>, value: u32, cap: usize) {
    window.push(value);
    if window.len() > cap {
        let excess = window.len() - cap;
        window.drain(..excess);
    }
}

/// Uniform point in the unit disc, by rejection from the enclosing square.
fn sample_in_disc(rng: &mut Prng) -> (f32, f32) {
    loop {
        let dx = rng.gen_range_f32(-1.0, 1.0);
        let dy = rng.gen_range_f32(-1.0, 1.0);
        if dx * dx + dy * dy <= 1.0 {
            return (dx, dy);
        }
    }
}

fn place_region(
    rng: &mut Prng,
    neurons: &mut Vec<Neuron>,
    region_index: usize,
    bounds: &Bounds,
    spec: &RegionSpec,
    scatter: f32,
) -> Region {
    let cx = bounds.x + bounds.width * spec.position.0;
    let cy = bounds.y + bounds.height * spec.position.1;
    let radius = bounds.width.min(bounds.height) * spec.size;

    let start = neurons.len();
    for _ in 0..spec.neuron_count {
        let (dx, dy) = sample_in_disc(rng);
        neurons.push(Neuron {
            potential: 0.0,
            activity: 0.0,
            refractory: 0,
            region: region_index,
            x: cx + dx * radius * scatter,
            y: cy + dy * radius * scatter,
            radius: rng.gen_range_f32(NEURON_RADIUS_MIN, NEURON_RADIUS_MAX),
        });
    }

    Region {
        id: spec.id.clone(),
        name: spec.name.clone(),
        color: spec.color.clone(),
        members: start..neurons.len(),
        x: cx,
        y: cy,
        radius,
        total_activity: 0.0,
    }
}

fn wire_topology(
    cfg: &NetworkConfig,
    regions: &[Region],
    hub_index: usize,
    rng: &mut Prng,
) -> Vec<Connection> {
    let mut connections = Vec::new();
    let (lo, hi) = (cfg.weight_init_min, cfg.weight_init_max);

    // Dense-ish recurrent wiring inside each region.
    for region in &regions[..hub_index] {
        for i in region.members.clone() {
            for j in region.members.clone() {
                if i != j && rng.gen_bool(cfg.intra_region_prob) {
                    connections.push(Connection::new(i, j, rng.gen_range_f32(lo, hi)));
                }
            }
        }
    }

    // Sparse feedforward wiring from earlier regions to later ones.
    for a in 0..hub_index {
        for b in a + 1..hub_index {
            for i in regions[a].members.clone() {
                for j in regions[b].members.clone() {
                    if rng.gen_bool(cfg.inter_region_prob) {
                        connections.push(Connection::new(i, j, rng.gen_range_f32(lo, hi)));
                    }
                }
            }
        }
    }

    // Bidirectional region<->hub links, each endpoint paired with a random
    // hub neuron.
    let hub_members = regions[hub_index].members.clone();
    for region in &regions[..hub_index] {
        for i in region.members.clone() {
            if rng.gen_bool(cfg.hub_link_prob) {
                let h = hub_members.start + rng.gen_range_usize(0, hub_members.len());
                connections.push(Connection::new(i, h, rng.gen_range_f32(lo, hi)));
            }
            if rng.gen_bool(cfg.hub_link_prob) {
                let h = hub_members.start + rng.gen_range_usize(0, hub_members.len());
                connections.push(Connection::new(h, i, rng.gen_range_f32(lo, hi)));
            }
        }
    }

    // Recurrent wiring inside the hub.
    for i in hub_members.clone() {
        for j in hub_members.clone() {
            if i != j && rng.gen_bool(cfg.hub_internal_prob) {
                connections.push(Connection::new(i, j, rng.gen_range_f32(lo, hi)));
            }
        }
    }

    connections
}
