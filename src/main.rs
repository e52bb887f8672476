use std::time::{Duration, Instant};

use hebbnet::prelude::*;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return;
    }
    if args.len() >= 2 && args[1] == "watch" {
        run_watch();
        return;
    }
    if args.len() >= 2 && args[1] != "train" {
        eprintln!("Unknown command: {}", args[1]);
        print_help();
        std::process::exit(2);
    }

    let ticks: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(60_000);
    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(42);
    run_train(ticks, seed);
}

fn print_help() {
    println!("hebbnet (region-structured reward-learning network)");
    println!("usage:");
    println!("  cargo run                          headless training demo");
    println!("  cargo run -- train [ticks] [seed]");
    println!("  cargo run -- watch                 wall-clock paced run (10 s)");
    println!("  cargo run -- --help");
}

fn build_sim(cfg: SimConfig) -> Simulation {
    match Simulation::new(cfg) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    }
}

/// Headless demo:
/// - the trial loop injects the fixed pattern every few seconds of sim time
/// - rewards push the first motor half to win the output competition
/// - the success rate and the weight ledger show whether it is working
fn run_train(ticks: u64, seed: u64) {
    let mut sim = build_sim(SimConfig::default().with_seed(seed));
    sim.play();

    println!(
        "training: {} neurons, {} connections, {} ticks, seed {}",
        sim.network().neuron_count(),
        sim.network().connection_count(),
        ticks,
        seed
    );

    for t in 0..ticks {
        sim.step();

        if t % 6000 == 0 && t > 0 {
            let trainer = sim.trainer();
            let (out1, out2) = trainer.outputs();
            let stats = sim.network().stats();
            println!(
                "t={t:6} trials={:4} success={:5.1}% out1={out1:+.3} out2={out2:+.3} active={:3} signals/s={}",
                trainer.total_trials(),
                trainer.success_rate() * 100.0,
                stats.active_neurons,
                stats.signals_this_second
            );
        }
    }

    let trainer = sim.trainer();
    let weights = sim.network().weight_stats();
    println!(
        "done: trials={} success={:.1}% strengthened={} weakened={} total_signals={}",
        trainer.total_trials(),
        trainer.success_rate() * 100.0,
        weights.strengthened,
        weights.weakened,
        sim.network().stats().total_signals
    );
}

/// Wall-clock paced run: a frame loop hands elapsed time to `advance`, which
/// converts it into whole ticks at the configured tick rate. Frame cadence
/// and tick cadence stay decoupled.
fn run_watch() {
    let mut sim = build_sim(SimConfig::default());
    sim.play();

    let started = Instant::now();
    let mut last_frame = Instant::now();
    let mut ticks_run: u32 = 0;
    let mut printed_secs: u64 = 0;

    while started.elapsed() < Duration::from_secs(10) {
        let now = Instant::now();
        ticks_run += sim.advance(now - last_frame);
        last_frame = now;

        let secs = started.elapsed().as_secs();
        if secs > printed_secs {
            printed_secs = secs;
            let trainer = sim.trainer();
            let (out1, out2) = trainer.outputs();
            println!(
                "{secs:2}s tick={:5} ({ticks_run:3} this second) trials={:2} out1={out1:+.3} out2={out2:+.3} active={:3}",
                sim.network().tick(),
                trainer.total_trials(),
                sim.network().stats().active_neurons
            );
            ticks_run = 0;
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    println!(
        "watched {} ticks, {} trials, success={:.1}%",
        sim.network().tick(),
        sim.trainer().total_trials(),
        sim.trainer().success_rate() * 100.0
    );
}
