use std::process::ExitCode;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use simval::report::artifact_name;
use simval::{Bucket, CategoryReport, MergedReport, ShardLocator, ValidationConfig, ValidationRun};

mod cli;

use cli::{Command, InspectArgs, LocationOptions, MergeArgs, RunArgs};

fn main() -> ExitCode {
    let cli = cli::parse();
    let debug = matches!(&cli.command, Command::Run(args) if args.debug);
    init_logging(debug);

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Merge(args) => merge(args),
        Command::Inspect(args) => inspect(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn locator(opts: &LocationOptions, label: &str) -> Result<ShardLocator> {
    if let (Some(truth), Some(sim)) = (&opts.truth_root, &opts.sim_root) {
        return Ok(ShardLocator::new(truth, sim, label));
    }
    let Some(data_path) = &opts.data_path else {
        anyhow::bail!("{} is not set", simval::locator::DATA_PATH_VAR);
    };
    let Some(tag) = &opts.production_tag else {
        anyhow::bail!("{} is not set", simval::locator::PRODUCTION_TAG_VAR);
    };
    Ok(ShardLocator::for_production(data_path, tag, label))
}

fn run(args: RunArgs) -> Result<()> {
    let flavor = args.category;
    let locator = locator(&args.location, flavor.label())?;

    let event_display = args.event_display && args.debug;
    if args.event_display && !args.debug {
        warn!("--event-display needs --debug; event displays disabled");
    }
    let (default_start, default_count) = if args.debug { (4, 1) } else { (0, 10) };
    let start = args.start_shard.unwrap_or(default_start);
    let shards = start..start + args.n_shards.unwrap_or(default_count);

    let mut config = ValidationConfig {
        debug: args.debug,
        event_display,
        plot_dir: args.plot_dir,
        max_truth_particles: (args.cuts.max_truth_particles > 0)
            .then_some(args.cuts.max_truth_particles),
        ..Default::default()
    };
    config.cuts.nu_final = !args.cuts.no_cut_nu_final;
    config.cuts.to_wall = !args.cuts.no_cut_to_wall;
    config.cuts.e_match = !args.cuts.no_cut_ematch;
    config.cuts.e_tolerance = args.cuts.e_tolerance;
    config.cuts.distance_cut_mm = args.cuts.distance_cut;

    let started = chrono::Local::now().naive_local();
    info!("Processing shards {:?} of {}", shards, flavor);
    let mut run = ValidationRun::with_start_time(flavor, config, started)?;
    run.process_shards(&locator, shards);
    let report = run.finish();

    std::fs::create_dir_all(&args.output_dir)?;
    let path = args.output_dir.join(artifact_name(flavor.label(), &started));
    report.save_to_file(&path)?;
    println!("{}", report.counters.summary(&report.label));
    Ok(())
}

fn merge(args: MergeArgs) -> Result<()> {
    let reports = args
        .reports
        .iter()
        .map(CategoryReport::load_from_file)
        .collect::<Result<Vec<_>>>()?;
    let merged = MergedReport::combine(&reports)?;
    merged.save_to_file(&args.output)?;
    println!("{}", merged.counters.summary("combined"));
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let (title, counters, buckets) = match CategoryReport::load_from_file(&args.report) {
        Ok(r) => (
            format!("{} (category {}), started {}", r.label, r.category, r.started),
            r.counters,
            r.buckets,
        ),
        Err(_) => {
            let m = MergedReport::load_from_file(&args.report)?;
            (format!("combined: {}", m.labels.join(", ")), m.counters, m.buckets)
        }
    };
    println!("{title}");
    println!("{}", counters.summary(&title));

    if let Some(name) = args.bucket {
        let Some(bucket) = buckets.iter().find(|b| b.name() == name) else {
            anyhow::bail!("no bucket named '{}'", name);
        };
        print_bins(bucket);
        return Ok(());
    }
    for b in &buckets {
        match b {
            Bucket::OneD(h) => println!(
                "{:<40} {:>10} entries, mean {}",
                h.name,
                h.entries(),
                h.mean().map_or("-".to_string(), |m| format!("{m:.4}"))
            ),
            Bucket::TwoD(h) => println!(
                "{:<40} {:>10} entries, integral {}",
                h.name,
                h.entries(),
                h.integral()
            ),
        }
    }
    Ok(())
}

fn print_bins(bucket: &Bucket) {
    match bucket {
        Bucket::OneD(h) => {
            println!("{}: underflow {}, overflow {}", h.name, h.underflow(), h.overflow());
            for (i, c) in h.contents().iter().enumerate().filter(|(_, c)| **c != 0.0) {
                println!("  [{:.6}, {:.6})  {}", h.axis.bin_low_edge(i), h.axis.bin_low_edge(i + 1), c);
            }
        }
        Bucket::TwoD(h) => {
            println!("{}: {} entries", h.name, h.entries());
            for (ix, iy, c) in h.nonzero_bins() {
                println!(
                    "  x {:.6}  y {:.6}  {}",
                    h.x_axis.bin_center(ix),
                    h.y_axis.bin_center(iy),
                    c
                );
            }
        }
    }
}
