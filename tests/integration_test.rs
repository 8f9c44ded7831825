//! Integration tests: write synthetic truth and simulation stores to disk, run
//! the validation over them and check the resulting buckets, counters and
//! reports.


use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use rand_distr::{Distribution, Normal};
use simval::kinematics::kinetic_energy_mev;
use simval::{
    CategoryReport, Flavor, MergedReport, Metric, MetricAggregator, ShardLocator, ShardStatus,
    ValidationConfig, ValidationRun,
};
use test_data::*;

const ELECTRON_P4: [f64; 4] = [0.0, 0.0, 0.1, 0.105];
const ORIGIN: [f64; 4] = [0.0; 4];

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

fn locator(root: &Path, flavor: Flavor) -> ShardLocator {
    ShardLocator::new(root.join("truth"), root.join("sim"), flavor.label())
}

/// Shard 0 of a dataset holding a single electron event at truth index 1.
fn write_single_electron_shard(loc: &ShardLocator, sim_ke: f64) {
    write_sparse_truth_store(
        &loc.truth_dir(0),
        2,
        &[(
            1,
            vec![
                incoming_neutrino(12, 1.0, ORIGIN),
                final_state(11, ELECTRON_P4, ORIGIN),
            ],
        )],
    );
    write_sim_store(&loc.sim_dir(0), &[sim_event(1, &[(11, sim_ke)])]);
}

#[test]
fn test_single_electron_end_to_end() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);

    // ── Step 1: Write the stores ──
    write_single_electron_shard(&loc, 5.0);

    // ── Step 2: Run ──
    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    let status = run.process_shard(0, &loc.truth_dir(0), &loc.sim_dir(0));
    assert_eq!(status, ShardStatus::Processed { events: 1 });

    // ── Step 3: Check the single-particle fill ──
    let truth_ke = kinetic_energy_mev(ELECTRON_P4).unwrap();
    assert!((truth_ke - 72.98).abs() < 0.01, "truth KE was {truth_ke}");

    let c = run.counters();
    assert_eq!(c.valid_shards, 1);
    assert_eq!(c.total_events, 1);
    assert_eq!(c.entries_mismatch, 0);
    assert_eq!(c.ke_count_mismatch, 0);
    assert_eq!(c.vertex_mismatch, 0);
    assert_eq!(c.invalid_kinematics, 0);

    let single = run.aggregator().histogram_2d(1, Metric::SingleEnergies).unwrap();
    assert_eq!(single.entries(), 1);
    let ix = single.x_axis.find_bin(truth_ke).unwrap();
    let iy = single.y_axis.find_bin(5.0).unwrap();
    assert_eq!(single.bin_content(ix, iy), 1.0);
    assert_eq!(single.integral(), 1.0);

    // Other categories stay untouched.
    for cat in 2..=4 {
        let h = run.aggregator().histogram_2d(cat, Metric::SingleEnergies).unwrap();
        assert_eq!(h.entries(), 0);
    }

    // ── Step 4: Photon and PE fills follow the simulated total ──
    let photons = run.aggregator().histogram_2d(1, Metric::PhotonsVsKe).unwrap();
    assert_eq!(photons.entries(), 1);
    let ix = photons.x_axis.find_bin(5.0).unwrap();
    let iy = photons.y_axis.find_bin(2160.0).unwrap();
    assert_eq!(photons.bin_content(ix, iy), 1.0);
    let pes = run.aggregator().histogram_2d(1, Metric::PesVsKe).unwrap();
    let iy = pes.y_axis.find_bin(42.0).unwrap();
    assert_eq!(pes.bin_content(pes.x_axis.find_bin(5.0).unwrap(), iy), 1.0);
}

#[test]
fn test_ke_count_mismatch_skips_single_fills() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Numu);

    let truth = vec![
        incoming_neutrino(14, 2.0, ORIGIN),
        final_state(13, [0.0, 0.0, 0.3, 0.32], ORIGIN),
        final_state(2212, [0.1, 0.0, 0.0, 0.95], ORIGIN),
        final_state(211, [0.0, 0.1, 0.0, 0.2], ORIGIN),
    ];
    write_sparse_truth_store(&loc.truth_dir(0), 2, &[(1, truth)]);
    write_sim_store(&loc.sim_dir(0), &[sim_event(1, &[(13, 100.0), (2212, 10.0)])]);

    let mut run = ValidationRun::new(Flavor::Numu, ValidationConfig::default()).unwrap();
    run.process_shards(&loc, 0..1);

    let c = run.counters();
    assert_eq!(c.total_events, 1);
    assert_eq!(c.ke_count_mismatch, 1);
    let agg = run.aggregator();
    assert_eq!(agg.histogram_2d(2, Metric::SingleEnergies).unwrap().entries(), 0);
    assert_eq!(agg.histogram_2d(2, Metric::TotalEnergy).unwrap().entries(), 1);
    assert_eq!(agg.histogram_1d(2, Metric::Ediff).unwrap().entries(), 1);
    assert_eq!(agg.histogram_2d(2, Metric::PesVsKe).unwrap().entries(), 1);

    let n_in = agg.histogram_1d(2, Metric::NParticlesInput).unwrap();
    assert_eq!(n_in.bin_content(n_in.axis.find_bin(3.0).unwrap()), 1.0);
    let n_out = agg.histogram_1d(2, Metric::NParticlesOutput).unwrap();
    assert_eq!(n_out.bin_content(n_out.axis.find_bin(2.0).unwrap()), 1.0);
}

#[test]
fn test_empty_simulated_list_still_fills_totals() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);

    let truth = vec![
        final_state(11, ELECTRON_P4, ORIGIN),
        final_state(2212, [0.1, 0.0, 0.0, 0.95], ORIGIN),
        final_state(211, [0.0, 0.1, 0.0, 0.2], ORIGIN),
    ];
    write_sparse_truth_store(&loc.truth_dir(0), 2, &[(1, truth)]);
    write_sim_store(&loc.sim_dir(0), &[sim_event(1, &[])]);

    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    run.process_shards(&loc, 0..1);

    assert_eq!(run.counters().total_events, 1);
    assert_eq!(run.counters().ke_count_mismatch, 1);
    let agg = run.aggregator();
    assert_eq!(agg.histogram_2d(1, Metric::SingleEnergies).unwrap().entries(), 0);
    assert_eq!(agg.histogram_2d(1, Metric::TotalEnergy).unwrap().entries(), 1);
    assert_eq!(agg.histogram_2d(1, Metric::PhotonsVsKe).unwrap().entries(), 1);
    assert_eq!(agg.histogram_2d(1, Metric::PesVsKe).unwrap().entries(), 1);
    assert_eq!(agg.histogram_1d(1, Metric::Ediff).unwrap().entries(), 1);
}

#[test]
fn test_unreadable_and_corrupt_shards_are_counted() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);

    // Shard 1: truth table lacks mandatory columns, simulation is fine.
    write_raw_table(&loc.truth_dir(1), "T", "EvtNum,StdHepN\n0,0\n");
    write_sim_store(&loc.sim_dir(1), &[sim_event(101, &[(11, 5.0)])]);
    // Shard 2: simulation cell is not a number.
    write_sparse_truth_store(&loc.truth_dir(2), 205, &[]);
    write_raw_table(&loc.sim_dir(2), "output", "evid,subev\n201,zero\n");

    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    // Shard 0 does not exist at all.
    assert_eq!(
        run.process_shard(0, &loc.truth_dir(0), &loc.sim_dir(0)),
        ShardStatus::Skipped
    );
    assert_eq!(
        run.process_shard(1, &loc.truth_dir(1), &loc.sim_dir(1)),
        ShardStatus::Skipped
    );
    assert_eq!(
        run.process_shard(2, &loc.truth_dir(2), &loc.sim_dir(2)),
        ShardStatus::Skipped
    );

    let c = run.counters();
    assert_eq!(c.truth_unreadable, 1);
    assert_eq!(c.sim_unreadable, 1);
    assert_eq!(c.truth_corrupt, 1);
    assert_eq!(c.sim_corrupt, 1);
    assert_eq!(c.valid_shards, 0);
    assert_eq!(c.total_events, 0);
}

#[test]
fn test_partial_alignment_at_truth_extent() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Anue);

    // Shard 1 starts at truth index 101; the truth store ends at 102.
    let electron = vec![final_state(-11, ELECTRON_P4, ORIGIN)];
    write_sparse_truth_store(
        &loc.truth_dir(1),
        103,
        &[(101, electron.clone()), (102, electron)],
    );
    let ke = kinetic_energy_mev(ELECTRON_P4).unwrap();
    write_sim_store(
        &loc.sim_dir(1),
        &[
            sim_event(101, &[(-11, ke)]),
            secondary_event(101, 1),
            sim_event(102, &[(-11, ke)]),
            sim_event(103, &[(-11, ke)]),
            sim_event(104, &[(-11, ke)]),
        ],
    );

    let mut run = ValidationRun::new(Flavor::Anue, ValidationConfig::default()).unwrap();
    // Offsets 0 and 2 map to truth 101 and 103: the second is past the end.
    assert_eq!(
        run.process_shard(1, &loc.truth_dir(1), &loc.sim_dir(1)),
        ShardStatus::Processed { events: 1 }
    );
    let c = run.counters();
    assert_eq!(c.total_events, 1);
    assert_eq!(c.entries_mismatch, 1);
    assert_eq!(c.ke_count_mismatch, 0);
    assert_eq!(c.energy_mismatch, 0);
}

#[test]
fn test_missing_column_disables_feature_for_run() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);
    let ke = kinetic_energy_mev(ELECTRON_P4).unwrap();
    let electron = vec![final_state(11, ELECTRON_P4, ORIGIN)];

    for shard in 0..3 {
        let index = shard * 100 + 1;
        write_sparse_truth_store(&loc.truth_dir(shard), index + 1, &[(index, electron.clone())]);
    }
    write_sim_store(&loc.sim_dir(0), &[sim_event(1, &[(11, ke)])]);
    // Shard 1 has no photoelectron columns.
    write_raw_table(
        &loc.sim_dir(1),
        "output",
        &format!("evid,subev,mcpdgs,mckes\n101,0,11,{ke}\n"),
    );
    write_sim_store(&loc.sim_dir(2), &[sim_event(201, &[(11, ke)])]);

    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    run.process_shards(&loc, 0..3);

    assert_eq!(run.counters().total_events, 3);
    let caps = run.capabilities().unwrap();
    assert!(!caps.photoelectrons);
    assert!(!caps.photons);
    assert!(caps.kinetic_energies);
    let agg = run.aggregator();
    assert_eq!(
        agg.histogram_2d(1, Metric::PesVsKe).unwrap().entries(),
        1,
        "only the shard before the loss fills PE metrics"
    );
    assert_eq!(agg.histogram_2d(1, Metric::TotalEnergy).unwrap().entries(), 3);
}

#[test]
fn test_to_wall_cut() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);
    let ke = kinetic_energy_mev(ELECTRON_P4).unwrap();

    write_sparse_truth_store(
        &loc.truth_dir(0),
        3,
        &[
            (1, vec![final_state(11, ELECTRON_P4, [0.0, 0.0, 980.0, 0.0])]),
            (2, vec![final_state(11, ELECTRON_P4, ORIGIN)]),
        ],
    );
    let mut near = sim_event(1, &[(11, ke)]);
    near.vertex = Some(simval::Vector3::new(0.0, 0.0, 980.0));
    write_sim_store(&loc.sim_dir(0), &[near, sim_event(2, &[(11, ke)])]);
    write_sensor_table(&loc.sim_dir(0), &cube_sensors(1000.0));

    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    run.process_shards(&loc, 0..1);
    assert!(run.geometry().is_loaded());
    assert_eq!(run.geometry().len(), 6);
    assert_eq!(run.counters().total_events, 2);
    assert_eq!(run.counters().near_wall, 1);
    assert_eq!(
        run.aggregator().histogram_2d(1, Metric::TotalEnergy).unwrap().entries(),
        1
    );

    let mut config = ValidationConfig::default();
    config.cuts.to_wall = false;
    let mut run = ValidationRun::new(Flavor::Nue, config).unwrap();
    run.process_shards(&loc, 0..1);
    assert_eq!(run.counters().near_wall, 1);
    assert_eq!(
        run.aggregator().histogram_2d(1, Metric::TotalEnergy).unwrap().entries(),
        2
    );
}

#[test]
fn test_geometry_loads_from_later_shard() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);
    let ke = kinetic_energy_mev(ELECTRON_P4).unwrap();
    let electron = vec![final_state(11, ELECTRON_P4, ORIGIN)];

    // Shard 0 has no sensor table; shard 1 does.
    write_sparse_truth_store(&loc.truth_dir(0), 2, &[(1, electron.clone())]);
    write_sim_store(&loc.sim_dir(0), &[sim_event(1, &[(11, ke)])]);
    write_sparse_truth_store(&loc.truth_dir(1), 102, &[(101, electron)]);
    write_sim_store(&loc.sim_dir(1), &[sim_event(101, &[(11, ke)])]);
    write_sensor_table(&loc.sim_dir(1), &cube_sensors(10000.0));

    let mut run = ValidationRun::new(Flavor::Nue, ValidationConfig::default()).unwrap();
    run.process_shards(&loc, 0..1);
    assert!(!run.geometry().is_loaded());

    run.process_shards(&loc, 1..2);
    assert!(run.geometry().is_loaded());
    assert_eq!(run.geometry().len(), 6);
    assert_eq!(run.counters().valid_shards, 2);
}

#[cfg(feature = "render")]
#[test]
fn test_event_display_written() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);
    write_single_electron_shard(&loc, 5.0);
    write_sensor_table(&loc.sim_dir(0), &cube_sensors(1000.0));

    let config = ValidationConfig {
        debug: true,
        event_display: true,
        plot_dir: tmp.path().join("Plots"),
        ..Default::default()
    };
    let mut run = ValidationRun::new(Flavor::Nue, config).unwrap();
    run.process_shards(&loc, 0..1);

    assert_eq!(run.counters().displays_rendered, 1);
    let svg = tmp.path().join("Plots").join("event_000001.svg");
    assert!(svg.is_file(), "missing {svg:?}");
}

#[test]
fn test_event_display_skipped_without_geometry() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let loc = locator(tmp.path(), Flavor::Nue);
    write_single_electron_shard(&loc, 5.0);

    let config = ValidationConfig {
        event_display: true,
        plot_dir: tmp.path().join("Plots"),
        ..Default::default()
    };
    let mut run = ValidationRun::new(Flavor::Nue, config).unwrap();
    run.process_shards(&loc, 0..1);
    assert_eq!(run.counters().total_events, 1);
    assert_eq!(run.counters().displays_rendered, 0);
    assert!(!tmp.path().join("Plots").join("event_000001.svg").exists());
}

#[test]
fn test_reports_save_load_and_merge() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    // ── Step 1: Run two categories ──
    let mut paths = Vec::new();
    for flavor in [Flavor::Nue, Flavor::Anumu] {
        let loc = locator(&tmp.path().join(flavor.label()), flavor);
        write_single_electron_shard(&loc, 5.0);
        let mut run = ValidationRun::new(flavor, ValidationConfig::default()).unwrap();
        run.process_shards(&loc, 0..1);
        let report = run.finish();
        let path = tmp.path().join(format!("validate_{}.rkyv", flavor.label()));
        report.save_to_file(&path).unwrap();
        paths.push(path);
    }

    // ── Step 2: Reload ──
    let reports: Vec<CategoryReport> = paths
        .iter()
        .map(|p| CategoryReport::load_from_file(p).unwrap())
        .collect();
    assert_eq!(reports[1].category, 4);
    assert_eq!(reports[1].label, "anumu");
    assert_eq!(
        reports[1].bucket(Metric::SingleEnergies).unwrap().name(),
        "h2d_ioSingleEnergies_04"
    );
    assert!(reports[0].parameters.cut_to_wall);

    // ── Step 3: Merge ──
    let merged = MergedReport::combine(&reports).unwrap();
    assert_eq!(merged.counters.total_events, 2);
    let single = merged.bucket(Metric::SingleEnergies).unwrap();
    assert_eq!(single.name(), "h2d_ioSingleEnergies_combined");
    assert_eq!(single.entries(), 2);

    let merged_path = tmp.path().join("combined.rkyv");
    merged.save_to_file(&merged_path).unwrap();
    let reloaded = MergedReport::load_from_file(&merged_path).unwrap();
    assert_eq!(reloaded, merged);
}

/// Fills are order independent, and partial aggregators merge to the same result.
#[test]
fn test_fill_order_independence() {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5).unwrap();

    // ── Step 1: Random events ──
    let events: Vec<(f64, f64)> = (0..500)
        .map(|_| {
            let truth = rng.random::<f64>() * 2000.0;
            (truth, truth + noise.sample(&mut rng))
        })
        .collect();

    let fill = |agg: &mut MetricAggregator, events: &[(f64, f64)]| {
        for &(t, s) in events {
            agg.fill_total_energy(1, t, s);
            agg.fill_ediff(1, t - s);
            agg.fill_energy_resolution(1, t, s);
        }
    };

    // ── Step 2: In order ──
    let mut ordered = MetricAggregator::new(Flavor::COUNT);
    fill(&mut ordered, &events);

    // ── Step 3: Shuffled ──
    let mut shuffled = events.clone();
    shuffled.shuffle(&mut rng);
    let mut reordered = MetricAggregator::new(Flavor::COUNT);
    fill(&mut reordered, &shuffled);

    // ── Step 4: Two partial workers ──
    let (a, b) = events.split_at(events.len() / 3);
    let mut worker_a = MetricAggregator::new(Flavor::COUNT);
    let mut worker_b = MetricAggregator::new(Flavor::COUNT);
    fill(&mut worker_b, b);
    fill(&mut worker_a, a);
    worker_b.merge(&worker_a).unwrap();

    assert_eq!(ordered.buckets(1), reordered.buckets(1));
    assert_eq!(ordered.buckets(1), worker_b.buckets(1));
    assert_eq!(
        ordered.histogram_1d(1, Metric::Ediff).unwrap().entries(),
        events.len() as u64
    );
}
