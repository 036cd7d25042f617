use std::error::Error;
use std::fs;
use std::io::{self, BufWriter, Write};

use connectome::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT_PREFIXES: &str = "MDL,MDR,MVL,MVR";
const DEFAULT_LOG_FILTER: &str = "info";

fn main() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        None | Some("demo") => run_demo(&args[args.len().min(2)..]),
        Some("run") => run_table(&args[2..]),
        Some("--help" | "-h" | "help") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` directives, falling back to INFO when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn print_help() {
    println!(
        "connectome - tick-driven connectome emulation

USAGE:
  connectome demo [TICKS]
      Run a synthetic random network and log diagnostics.

  connectome run <TABLE.json> --stim A,B,.. --query X,Y,.. [options]
      Load a named connectome, stimulate the given units every tick and print
      one line per tick with the 0/1 discharge flags of the queried units.

      --ticks N                 number of ticks (default 1000)
      --output-prefixes P,Q,..  names starting with these are output units
                                (default {DEFAULT_OUTPUT_PREFIXES})
      --threshold T             discharge threshold (default {})
      --idle-limit L            idle ticks before a forced reset (default {})

      Set RUST_LOG=debug or RUST_LOG=trace for load and per-tick logging.

  connectome help",
        connectome::engine::DEFAULT_THRESHOLD,
        connectome::engine::DEFAULT_IDLE_LIMIT,
    );
}

fn run_demo(args: &[String]) -> Result<(), Box<dyn Error>> {
    let ticks: u64 = match args.first() {
        Some(s) => s.parse()?,
        None => 500,
    };

    let table = TableBuilder::random(302, 397, 12, 42).build()?;
    let mut engine = Engine::new(&table);
    let stimulus: Vec<UnitId> = (0..8).collect();

    info!(
        cells = table.cell_count(),
        signaling = table.signaling_count(),
        connections = table.connection_count(),
        "demo network ready"
    );

    for t in 0..ticks {
        engine.tick(&stimulus)?;
        if t % 50 == 0 {
            let d = engine.diagnostics();
            let drive: i32 = engine.output_potentials().iter().map(|&p| p as i32).sum();
            println!(
                "t={t:5} discharged={:3} output_drive={drive:+6}",
                d.discharged_last_tick
            );
        }
    }

    let snap = EngineAdapter::new(&engine).snapshot();
    info!(
        tick = snap.tick,
        discharged = snap.discharged_units().len(),
        "demo finished"
    );
    Ok(())
}

struct RunOptions {
    path: String,
    stim: Vec<String>,
    query: Vec<String>,
    ticks: u64,
    output_prefixes: Vec<String>,
    cfg: EngineConfig,
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_run_args(args: &[String]) -> Result<RunOptions, Box<dyn Error>> {
    let mut path = None;
    let mut stim = Vec::new();
    let mut query = Vec::new();
    let mut ticks = 1000;
    let mut output_prefixes = split_list(DEFAULT_OUTPUT_PREFIXES);
    let mut cfg = EngineConfig::default();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = || {
            it.next()
                .cloned()
                .ok_or_else(|| format!("missing value for {arg}"))
        };
        match arg.as_str() {
            "--stim" => stim = split_list(&value()?),
            "--query" => query = split_list(&value()?),
            "--ticks" => ticks = value()?.parse()?,
            "--output-prefixes" => output_prefixes = split_list(&value()?),
            "--threshold" => cfg = cfg.with_threshold(value()?.parse()?),
            "--idle-limit" => cfg = cfg.with_idle_limit(value()?.parse()?),
            s if s.starts_with("--") => return Err(format!("unknown option {s}").into()),
            s => path = Some(s.to_string()),
        }
    }

    let path = path.ok_or("missing connectome table path")?;
    if query.is_empty() {
        return Err("--query needs at least one unit".into());
    }

    Ok(RunOptions {
        path,
        stim,
        query,
        ticks,
        output_prefixes,
        cfg,
    })
}

fn run_table(args: &[String]) -> Result<(), Box<dyn Error>> {
    let opts = parse_run_args(args)?;

    let json = fs::read_to_string(&opts.path)?;
    let named = NamedTable::from_json_str(&json, |name| {
        opts.output_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    })?;
    let stim = named.ids(opts.stim.as_slice())?;
    let query = named.ids(opts.query.as_slice())?;

    let mut engine = Engine::with_config(named.table(), opts.cfg)?;
    info!(
        path = %opts.path,
        cells = named.table().cell_count(),
        signaling = named.table().signaling_count(),
        ticks = opts.ticks,
        "running connectome"
    );

    // Validate the query once so the loop below only fails on I/O.
    engine.discharged(&query)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..opts.ticks {
        engine.tick(&stim)?;
        let flags = engine.discharged(&query)?;
        let line: Vec<&str> = flags.iter().map(|&f| if f { "1" } else { "0" }).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}
