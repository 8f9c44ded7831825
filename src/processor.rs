//! Validation run driver.
//!
//! A [`ValidationRun`] owns the aggregator, counters and sensor geometry for
//! one category and consumes shards one at a time:
//!
//! 1. Open the truth and simulation stores of the shard. A store that fails to
//!    open is counted as unreadable or corrupt and the shard is skipped.
//! 2. Intersect the simulation store's column capabilities with those seen so
//!    far; a feature missing once stays off for the rest of the run.
//! 3. Load the sensor geometry from the simulation store, retrying on every
//!    shard until one provides a usable sensor table.
//! 4. Align the shard and process every event pair: energy comparison, cuts,
//!    marginal distributions, resolutions and the optional event display.
//!
//! [`ValidationRun::finish`] turns the accumulated state into a
//! [`CategoryReport`].

use std::ops::Range;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::align::{EventPair, RecordAligner};
use crate::category::Flavor;
use crate::config::ValidationConfig;
use crate::counters::ValidationCounters;
use crate::display::{DisplaySkip, EventDisplay};
use crate::geometry::GeometryClassifier;
use crate::kinematics::{self, InvalidKinematics};
use crate::locator::ShardLocator;
use crate::metrics::{Metric, MetricAggregator, Side};
use crate::particle::{is_neutrino, LightYieldClass, Species, SpeciesCounts};
use crate::report::CategoryReport;
use crate::store::{SensorTable, SimCapabilities, SimRecord, SimStore, StoreError, TruthStore};
use crate::Vector3;

#[cfg(feature = "render")]
use crate::display::EventRenderer;

/// What happened to one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    /// Both stores opened; `events` pairs were aligned and processed.
    Processed { events: usize },
    /// At least one store could not be opened.
    Skipped,
}

/// Accumulated state of a validation run over one category.
pub struct ValidationRun {
    flavor: Flavor,
    config: ValidationConfig,
    started: NaiveDateTime,
    aggregator: MetricAggregator,
    counters: ValidationCounters,
    geometry: GeometryClassifier,
    capabilities: Option<SimCapabilities>,
    #[cfg(feature = "render")]
    renderer: Option<EventRenderer>,
}

impl ValidationRun {
    /// Start a run. Fails only if the event display directory cannot be created.
    pub fn new(flavor: Flavor, config: ValidationConfig) -> anyhow::Result<Self> {
        Self::with_start_time(flavor, config, chrono::Local::now().naive_local())
    }

    pub fn with_start_time(
        flavor: Flavor,
        config: ValidationConfig,
        started: NaiveDateTime,
    ) -> anyhow::Result<Self> {
        #[cfg(feature = "render")]
        let renderer = if config.event_display {
            Some(EventRenderer::new(&config.plot_dir)?)
        } else {
            None
        };
        if cfg!(not(feature = "render")) && config.event_display {
            warn!("Event display requested but rendering support is not compiled in");
        }

        info!(
            "Validation run for {} (category {}), debug={}, event_display={}",
            flavor,
            flavor.id(),
            config.debug,
            config.event_display
        );
        Ok(ValidationRun {
            flavor,
            geometry: GeometryClassifier::new(config.sensor_length_scale),
            config,
            started,
            aggregator: MetricAggregator::new(Flavor::COUNT),
            counters: ValidationCounters::default(),
            capabilities: None,
            #[cfg(feature = "render")]
            renderer,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn counters(&self) -> &ValidationCounters {
        &self.counters
    }

    pub fn aggregator(&self) -> &MetricAggregator {
        &self.aggregator
    }

    pub fn geometry(&self) -> &GeometryClassifier {
        &self.geometry
    }

    /// Feature set common to every simulation store seen so far.
    pub fn capabilities(&self) -> Option<SimCapabilities> {
        self.capabilities
    }

    /// Process a range of shards resolved through `locator`.
    pub fn process_shards(&mut self, locator: &ShardLocator, shards: Range<usize>) {
        for shard in shards {
            let truth_dir = locator.truth_dir(shard);
            let sim_dir = locator.sim_dir(shard);
            self.process_shard(shard, &truth_dir, &sim_dir);
        }
    }

    /// Process one shard given its store directories.
    pub fn process_shard(&mut self, shard: usize, truth_dir: &Path, sim_dir: &Path) -> ShardStatus {
        let truth = TruthStore::open(truth_dir, self.config.max_truth_particles);
        let sim = SimStore::open(sim_dir);
        if let Err(e) = &truth {
            self.record_store_failure(shard, e, true);
        }
        if let Err(e) = &sim {
            self.record_store_failure(shard, e, false);
        }
        let (Ok(truth), Ok(sim)) = (truth, sim) else {
            return ShardStatus::Skipped;
        };
        self.counters.valid_shards += 1;

        let caps = self.update_capabilities(&sim);
        if !self.geometry.is_loaded() {
            self.load_geometry(sim.dir());
        }

        let mut alignment = RecordAligner.align(shard, &truth, &sim);
        let primaries = alignment.primary_entries();
        let mut events = 0;
        for pair in alignment.by_ref() {
            self.process_event(&pair, &caps);
            events += 1;
        }
        if events < primaries {
            self.counters.entries_mismatch += 1;
            warn!(
                "Shard {}: aligned {} of {} simulation entries (truth store holds {})",
                shard,
                events,
                primaries,
                truth.len()
            );
        }
        info!("Shard {}: {} events processed", shard, events);
        ShardStatus::Processed { events }
    }

    fn record_store_failure(&mut self, shard: usize, err: &StoreError, truth: bool) {
        let kind = if truth { "truth" } else { "simulation" };
        match (truth, err.is_unreadable()) {
            (true, true) => self.counters.truth_unreadable += 1,
            (true, false) => self.counters.truth_corrupt += 1,
            (false, true) => self.counters.sim_unreadable += 1,
            (false, false) => self.counters.sim_corrupt += 1,
        }
        warn!("Shard {}: skipping, {} store: {}", shard, kind, err);
    }

    fn update_capabilities(&mut self, sim: &SimStore) -> SimCapabilities {
        let before = self.capabilities.unwrap_or(SimCapabilities::ALL);
        let after = before.intersect(&sim.capabilities());
        let already_missing = before.missing();
        for feature in after.missing() {
            if !already_missing.contains(&feature) {
                warn!(
                    "Simulation store {:?} lacks {}; disabled for the rest of the run",
                    sim.dir(),
                    feature
                );
            }
        }
        self.capabilities = Some(after);
        after
    }

    fn load_geometry(&mut self, sim_dir: &Path) {
        match SensorTable::read(sim_dir) {
            Ok(Some(table)) => {
                self.geometry.load(&table);
            }
            Ok(None) => warn!("No sensor table in {:?}; geometry unavailable", sim_dir),
            Err(e) => warn!("Sensor table in {:?} unusable: {}", sim_dir, e),
        }
    }

    // ── Per-event processing ───────────────────────────────────────────────

    fn process_event(&mut self, pair: &EventPair<'_>, caps: &SimCapabilities) {
        let cat = self.flavor.id();
        let cuts = self.config.cuts;
        let sim = pair.sim;
        self.counters.total_events += 1;
        if pair.truth.is_truncated() {
            self.counters.truncated_truth += 1;
        }

        let sim_vertex = sim.vertex.filter(|_| caps.primary_vertex);
        if let Some(vtx) = sim_vertex {
            if self.near_wall(&vtx) {
                self.counters.near_wall += 1;
                if cuts.to_wall {
                    debug!("Event {}: vertex within wall cut, skipped", pair.truth_index);
                    return;
                }
            }
        }

        // Truth final state.
        let mut has_neutrino = false;
        let mut truth_kes = Vec::new();
        for p in pair.truth.final_state() {
            if is_neutrino(p.pdg) {
                has_neutrino = true;
                if cuts.nu_final {
                    continue;
                }
            }
            match kinematics::kinetic_energy_mev(p.p4) {
                Ok(ke) => {
                    truth_kes.push(ke);
                    self.aggregator.fill_species(cat, Side::Truth, p.pdg);
                    if let Some(dir) = kinematics::direction(&p.momentum()) {
                        self.aggregator.fill_directions(cat, Side::Truth, &dir);
                    }
                }
                Err(e) => self.record_invalid_kinematics(pair, p.pdg, &e),
            }
        }
        if has_neutrino {
            self.counters.final_state_neutrino += 1;
        }

        // Per-particle and total energies.
        let sim_kes: &[f64] = if caps.kinetic_energies { &sim.kes } else { &[] };
        let mut n_matched = 0;
        if caps.kinetic_energies {
            if truth_kes.len() == sim_kes.len() {
                for (&t, &s) in truth_kes.iter().zip(sim_kes) {
                    self.aggregator.fill_single_energies(cat, t, s);
                    if (t - s).abs() <= cuts.e_tolerance * t.abs().max(1.0) {
                        n_matched += 1;
                    }
                }
            } else {
                self.counters.ke_count_mismatch += 1;
                debug!(
                    "Event {}: {} truth vs {} simulated particles",
                    pair.truth_index,
                    truth_kes.len(),
                    sim_kes.len()
                );
            }
        }
        let n_output = sim_kes.len().max(sim.pdgs.len());
        self.aggregator
            .fill_particle_counts(cat, truth_kes.len(), n_output, n_matched);

        // Event totals fill even when the lists differ or one side is empty.
        let ke_in: f64 = truth_kes.iter().sum();
        let ke_out: f64 = sim_kes.iter().sum();
        self.aggregator.fill_total_energy(cat, ke_in, ke_out);
        if let (true, Some(photons)) = (caps.photons, sim.photons) {
            self.aggregator.fill_photons_vs_ke(cat, ke_out, &photons);
        }
        if caps.photoelectrons {
            let pes = sim.total_photoelectrons();
            self.aggregator.fill_pes_vs_ke(cat, ke_out, pes);
            let class = leading_class(sim, caps);
            self.aggregator.fill_light_yield(cat, ke_out, pes, class);
        }

        let diff = ke_in - ke_out;
        self.aggregator.fill_ediff(cat, diff);
        self.classify_ediff(diff);

        let matched = diff.abs() <= cuts.e_tolerance * ke_in;
        if !matched {
            self.counters.energy_mismatch += 1;
        }
        if matched || !cuts.e_match {
            self.aggregator.fill_energy_resolution(cat, ke_in, ke_out);
        }
        debug!(
            "Event {}: KE in = {:.3} MeV, KE out = {:.3} MeV, diff = {:.3e}",
            pair.truth_index, ke_in, ke_out, diff
        );
        if caps.positions {
            if let Some((pos, t)) = sim.first_particle_position() {
                debug!(
                    "Event {}: first particle at ({:.1}, {:.1}, {:.1}) mm, t = {:.2} ns",
                    pair.truth_index, pos.x, pos.y, pos.z, t
                );
            }
        }

        // Vertex.
        let truth_vertex = pair.truth.particles.first().map(|p| p.position());
        if let Some(v) = truth_vertex {
            self.aggregator.fill_positions(cat, Side::Truth, &v);
        }
        if let Some(v) = sim_vertex {
            self.aggregator.fill_positions(cat, Side::Sim, &v);
        }
        if let (Some(t), Some(s)) = (truth_vertex, sim_vertex) {
            let delta = t - s;
            self.aggregator.fill_position_resolution(cat, &delta);
            if delta.iter().any(|d| d.abs() > self.config.vertex_tolerance_mm) {
                self.counters.vertex_mismatch += 1;
                debug!("Event {}: vertex offset {:?} mm", pair.truth_index, delta);
            }
        }

        // Simulated particles.
        if caps.species {
            for &pdg in &sim.pdgs {
                self.aggregator.fill_species(cat, Side::Sim, pdg);
            }
            let counts = SpeciesCounts::from_pdgs(sim.pdgs.iter().copied());
            self.aggregator.fill_multiplicities(cat, &counts);
        }
        if caps.directions {
            for p in sim.particles() {
                let Some(dir) = kinematics::direction(&p.direction) else {
                    continue;
                };
                self.aggregator.fill_directions(cat, Side::Sim, &dir);
                let species = if caps.species {
                    Species::from_pdg(p.pdg)
                } else {
                    Species::Other
                };
                self.aggregator.fill_angles(cat, species, &dir, p.ke_mev);
            }
        }

        if self.config.event_display {
            self.render(pair.truth_index, sim, caps);
        }
    }

    fn near_wall(&self, vertex_mm: &Vector3) -> bool {
        let scale = self.config.sensor_length_scale;
        self.geometry
            .distance_to_wall(&(vertex_mm * scale))
            .is_some_and(|d| d < self.config.cuts.distance_cut_mm * scale)
    }

    fn classify_ediff(&mut self, diff: f64) {
        let range = Metric::Ediff.spec().x.hi;
        if !diff.is_finite() {
            self.counters.diff_invalid += 1;
            return;
        }
        let d = diff.abs();
        if d >= range {
            self.counters.diff_out_range += 1;
        }
        if d > 5.0 * range {
            self.counters.diff_out_5x_range += 1;
        }
        if (1.0..10.0).contains(&d) {
            self.counters.diff_1_10_mev += 1;
        }
    }

    fn record_invalid_kinematics(&mut self, pair: &EventPair<'_>, pdg: i32, err: &InvalidKinematics) {
        self.counters.invalid_kinematics += 1;
        debug!(
            "Event {}: dropping particle PDG={} ({})",
            pair.truth_index, pdg, err
        );
    }

    fn build_display(
        &self,
        event_number: usize,
        sim: &SimRecord,
        caps: &SimCapabilities,
    ) -> Result<EventDisplay, DisplaySkip> {
        if !caps.sensor_hits {
            return Err(DisplaySkip::SensorHitsUnavailable);
        }
        EventDisplay::build(
            event_number,
            sim,
            &self.geometry,
            self.config.sensor_length_scale,
            self.config.max_listed_particles,
        )
    }

    #[cfg(feature = "render")]
    fn render(&mut self, event_number: usize, sim: &SimRecord, caps: &SimCapabilities) {
        if self.renderer.is_none() {
            return;
        }
        let display = match self.build_display(event_number, sim, caps) {
            Ok(d) => d,
            Err(reason) => {
                warn!("Event {}: no display, {}", event_number, reason);
                return;
            }
        };
        let Some(renderer) = &self.renderer else {
            return;
        };
        match renderer.render(&display) {
            Ok(path) => {
                self.counters.displays_rendered += 1;
                debug!("Event {}: display written to {:?}", event_number, path);
            }
            Err(e) => warn!("Event {}: display failed: {}", event_number, e),
        }
    }

    #[cfg(not(feature = "render"))]
    fn render(&mut self, event_number: usize, sim: &SimRecord, caps: &SimCapabilities) {
        if let Err(reason) = self.build_display(event_number, sim, caps) {
            debug!("Event {}: no display, {}", event_number, reason);
        }
    }

    /// Close the run and produce its report.
    pub fn finish(self) -> CategoryReport {
        let label = self.flavor.label();
        info!("\n{}", self.counters.summary(label));
        let buckets = self
            .aggregator
            .buckets(self.flavor.id())
            .map(<[_]>::to_vec)
            .unwrap_or_default();
        CategoryReport {
            category: self.flavor.id(),
            label: label.to_string(),
            started: self.started.format("%Y%m%d_%H%M%S").to_string(),
            parameters: self.config.run_parameters(),
            counters: self.counters,
            buckets,
        }
    }
}

/// Light-yield class of the most energetic simulated particle.
fn leading_class(sim: &SimRecord, caps: &SimCapabilities) -> LightYieldClass {
    let leading_pdg = if caps.species {
        sim.kes
            .iter()
            .zip(&sim.pdgs)
            .filter(|(ke, _)| ke.is_finite())
            .max_by(|a, b| a.0.total_cmp(b.0))
            .map(|(_, &pdg)| pdg)
    } else {
        None
    };
    leading_pdg
        .or(sim.primary_pdg)
        .map_or(LightYieldClass::Electron, LightYieldClass::from_pdg)
}
