//! Headless driver for the hebbnet simulation.
//!
//! Examples:
//!   hebbnet-cli run --ticks 30000 --seed 7
//!   hebbnet-cli snapshot --ticks 600 > snap.json
//!   hebbnet-cli topology > layout.json
//!   hebbnet-cli config
//!
//! JSON goes to stdout; progress and errors go to stderr.

use std::process;

use hebbnet::prelude::*;

struct Options {
    ticks: u64,
    seed: u64,
    speed: f32,
}

fn usage() -> ! {
    eprintln!("hebbnet-cli (headless simulation driver)");
    eprintln!("Usage: hebbnet-cli <command> [--ticks n] [--seed n] [--speed x]\n");
    eprintln!("Commands:");
    eprintln!("  run         Run, printing a status line every 10 s of sim time");
    eprintln!("  snapshot    Run, then dump the full state snapshot as JSON");
    eprintln!("  topology    Dump the untouched tick-zero layout as JSON");
    eprintln!("  config      Dump the default configuration as JSON");
    process::exit(1);
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

fn parse_args() -> (String, Options) {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }
    let cmd = args[0].clone();
    let mut opts = Options {
        ticks: 6_000,
        seed: 42,
        speed: 1.0,
    };

    let mut i = 1;
    while i < args.len() {
        if i + 1 >= args.len() {
            usage();
        }
        let value = &args[i + 1];
        match args[i].as_str() {
            "--ticks" => {
                opts.ticks = value
                    .parse()
                    .unwrap_or_else(|_| fail("--ticks must be a tick count"));
            }
            "--seed" => {
                opts.seed = value
                    .parse()
                    .unwrap_or_else(|_| fail("--seed must be a number"));
            }
            "--speed" => {
                opts.speed = value
                    .parse()
                    .unwrap_or_else(|_| fail("--speed must be a positive number"));
            }
            _ => usage(),
        }
        i += 2;
    }

    (cmd, opts)
}

fn build(opts: &Options) -> Simulation {
    let cfg = SimConfig::default().with_seed(opts.seed);
    let mut sim =
        Simulation::new(cfg).unwrap_or_else(|e| fail(&format!("invalid configuration: {e}")));
    sim.set_speed(opts.speed).unwrap_or_else(|e| fail(e));
    sim
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(&format!("serialize: {e}")));
    println!("{json}");
}

fn run(opts: &Options) {
    let mut sim = build(opts);
    sim.play();
    let interval = sim.tick_hz() as u64 * 10;

    for t in 0..opts.ticks {
        sim.step();
        if (t + 1) % interval == 0 {
            let trainer = sim.trainer();
            let (out1, out2) = trainer.outputs();
            let stats = sim.network().stats();
            eprintln!(
                "t={:6} trials={:4} success={:5.1}% out1={out1:+.3} out2={out2:+.3} active={:3} signals/s={}",
                t + 1,
                trainer.total_trials(),
                trainer.success_rate() * 100.0,
                stats.active_neurons,
                stats.signals_this_second
            );
        }
    }

    let weights = sim.network().weight_stats();
    println!(
        "trials={} success={:.1}% strengthened={} weakened={} total_signals={}",
        sim.trainer().total_trials(),
        sim.trainer().success_rate() * 100.0,
        weights.strengthened,
        weights.weakened,
        sim.network().stats().total_signals
    );
}

fn snapshot(opts: &Options) {
    let mut sim = build(opts);
    sim.play();
    for _ in 0..opts.ticks {
        sim.step();
    }
    print_json(&SimSnapshot::capture(&sim));
}

fn topology(opts: &Options) {
    let sim = build(opts);
    print_json(&SimSnapshot::capture(&sim));
}

fn config() {
    print_json(&SimConfig::default());
}

fn main() {
    let (cmd, opts) = parse_args();
    match cmd.as_str() {
        "run" => run(&opts),
        "snapshot" => snapshot(&opts),
        "topology" => topology(&opts),
        "config" => config(),
        _ => usage(),
    }
}
