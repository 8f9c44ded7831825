//! Per-event display: photoelectron maps on the six detector faces plus a
//! text summary of the simulated event.
//!
//! [`EventDisplay::build`] prepares the content and is always available.
//! [`EventRenderer`] draws it to an SVG file and needs the `render` feature.
//!
//! Canvas layout (1600 × 900):
//!
//! ```text
//! ┌──────────────────────────────┬────────┐
//! │ +X                           │  text  │
//! ├──────────────────────────────┤        │
//! │ -X                           │        │
//! ├──────────────────────────────┼────────┤
//! │ +Z                           │   -Y   │
//! ├──────────────────────────────┼────────┤
//! │ -Z                           │   +Y   │
//! └──────────────────────────────┴────────┘
//!            78 %                   22 %
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::geometry::{Face, GeometryClassifier};
use crate::histogram::{Axis, Histogram2D};
use crate::particle::pdg_name;
use crate::store::SimRecord;

/// Why an event display was not produced. None of these is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplaySkip {
    #[error("sensor geometry is not loaded")]
    GeometryUnloaded,
    #[error("no photoelectron data")]
    NoPhotoelectrons,
    #[error("{ids} sensor ids but {npe} photoelectron counts")]
    LengthMismatch { ids: usize, npe: usize },
    #[error("per-sensor hit columns are missing")]
    SensorHitsUnavailable,
}

/// Prepared content of one event display.
#[derive(Debug, Clone)]
pub struct EventDisplay {
    pub event_number: usize,
    /// Photoelectron map of every face.
    pub faces: BTreeMap<Face, Histogram2D>,
    /// Text panel, one entry per line.
    pub lines: Vec<String>,
}

impl EventDisplay {
    /// Collect the face maps and text panel of one event.
    ///
    /// `length_scale` converts the vertex to metres; `max_listed` caps the
    /// particles listed in the text panel.
    pub fn build(
        event_number: usize,
        sim: &SimRecord,
        geometry: &GeometryClassifier,
        length_scale: f64,
        max_listed: usize,
    ) -> Result<Self, DisplaySkip> {
        if !geometry.is_loaded() {
            return Err(DisplaySkip::GeometryUnloaded);
        }
        if sim.mc_pmt_npe.is_empty() {
            return Err(DisplaySkip::NoPhotoelectrons);
        }
        if sim.mc_pmt_id.len() != sim.mc_pmt_npe.len() {
            return Err(DisplaySkip::LengthMismatch {
                ids: sim.mc_pmt_id.len(),
                npe: sim.mc_pmt_npe.len(),
            });
        }

        let mut faces = BTreeMap::new();
        for face in Face::PRIORITY {
            if let Some(grid) = geometry.face_grid(face, format!("event_{event_number:06}_{face:?}")) {
                faces.insert(face, grid);
            }
        }
        for (&id, &npe) in sim.mc_pmt_id.iter().zip(&sim.mc_pmt_npe) {
            let Some(face) = geometry.classify(id) else {
                continue;
            };
            let (Some(grid), Some((h, v))) = (faces.get_mut(&face), geometry.project(face, id)) else {
                continue;
            };
            // Sensors on the far edge of a face belong in its last bin.
            let h = h.min(last_bin_center(&grid.x_axis));
            let v = v.min(last_bin_center(&grid.y_axis));
            grid.fill_weighted(h, v, npe as f64);
        }

        Ok(EventDisplay {
            event_number,
            faces,
            lines: text_lines(event_number, sim, length_scale, max_listed),
        })
    }
}

fn last_bin_center(axis: &Axis) -> f64 {
    axis.bin_center(axis.bins as usize - 1)
}

fn text_lines(event_number: usize, sim: &SimRecord, length_scale: f64, max_listed: usize) -> Vec<String> {
    let mut lines = vec![format!("Event {event_number}")];

    let deposited: f64 = sim.kes.iter().filter(|k| k.is_finite() && **k > 0.0).sum();
    lines.push(format!(
        "True total deposited energy = {:.2} GeV",
        deposited * 0.001
    ));

    if let Some(ph) = sim.photons {
        lines.push(format!("True number of photons = {:e}", ph.total()));
        lines.push(format!(" - scintillation = {:e}", ph.scintillation));
        lines.push(format!(" - Cherenkov = {:e}", ph.cherenkov));
        lines.push(format!(" - reemitted = {:e}", ph.reemitted));
    }
    lines.push(format!(
        "True number of collected PEs = {}",
        sim.total_photoelectrons()
    ));

    let mut particles = sim.particles();
    let n_particles = sim
        .particle_count
        .map_or(particles.len(), |n| n.max(0) as usize);
    let position = sim.first_particle_position().map(|(p, _)| p).or(sim.vertex);
    if let Some(pos) = position {
        let p = pos * length_scale;
        lines.push(format!(
            "Pos = ({:.2}, {:.2}, {:.2}) m, Total particles = {}:",
            p.x, p.y, p.z, n_particles
        ));
    } else {
        lines.push(format!("Total particles = {n_particles}:"));
    }

    let sort_key = |ke: f64| if ke.is_nan() { f64::NEG_INFINITY } else { ke };
    particles.sort_by(|a, b| sort_key(b.ke_mev).total_cmp(&sort_key(a.ke_mev)));
    for p in particles.iter().take(max_listed) {
        lines.push(format!(
            " - {} (PDG={}), Dir = ({:.2}, {:.2}, {:.2})",
            pdg_name(p.pdg),
            p.pdg,
            p.direction.x,
            p.direction.y,
            p.direction.z
        ));
        lines.push(format!("   True KE = {:.2} MeV", p.ke_mev));
    }
    if particles.len() > max_listed {
        lines.push(format!(
            " + {} particles not listed",
            particles.len() - max_listed
        ));
    }
    lines
}

#[cfg(feature = "render")]
pub use renderer::EventRenderer;

#[cfg(feature = "render")]
mod renderer {
    use std::error::Error;
    use std::path::{Path, PathBuf};

    use plotters::prelude::*;

    use super::EventDisplay;
    use crate::geometry::Face;
    use crate::histogram::Histogram2D;

    const CANVAS: (u32, u32) = (1600, 900);
    const LEFT_FRACTION: f64 = 0.78;

    /// Writes event displays as `event_NNNNNN.svg` into a plot directory.
    #[derive(Debug, Clone)]
    pub struct EventRenderer {
        plot_dir: PathBuf,
    }

    impl EventRenderer {
        /// Creates `plot_dir` if needed.
        pub fn new<P: AsRef<Path>>(plot_dir: P) -> anyhow::Result<Self> {
            let plot_dir = plot_dir.as_ref().to_path_buf();
            std::fs::create_dir_all(&plot_dir)?;
            Ok(EventRenderer { plot_dir })
        }

        pub fn path_for(&self, event_number: usize) -> PathBuf {
            self.plot_dir.join(format!("event_{event_number:06}.svg"))
        }

        /// Draw one display and return the written path.
        pub fn render(&self, display: &EventDisplay) -> anyhow::Result<PathBuf> {
            let path = self.path_for(display.event_number);
            draw(&path, display)
                .map_err(|e| anyhow::anyhow!("drawing {:?} failed: {}", path, e))?;
            Ok(path)
        }
    }

    fn draw(path: &Path, display: &EventDisplay) -> Result<(), Box<dyn Error>> {
        let root = SVGBackend::new(path, CANVAS).into_drawing_area();
        root.fill(&WHITE)?;

        let split = (CANVAS.0 as f64 * LEFT_FRACTION) as u32;
        let (left, right) = root.split_horizontally(split);
        let left_panels = left.split_evenly((4, 1));
        let (text_area, right_bottom) = right.split_vertically(CANVAS.1 / 2);
        let right_panels = right_bottom.split_evenly((2, 1));

        let layout = [
            (Face::XPlus, &left_panels[0]),
            (Face::XMinus, &left_panels[1]),
            (Face::ZPlus, &left_panels[2]),
            (Face::ZMinus, &left_panels[3]),
            (Face::YMinus, &right_panels[0]),
            (Face::YPlus, &right_panels[1]),
        ];
        let max_pe = display
            .faces
            .values()
            .map(Histogram2D::max_content)
            .fold(0.0, f64::max);
        for (face, area) in layout {
            if let Some(grid) = display.faces.get(&face) {
                draw_face(area, face, grid, max_pe)?;
            }
        }

        for (i, line) in display.lines.iter().enumerate() {
            text_area.draw(&Text::new(
                line.clone(),
                (10, 20 + 22 * i as i32),
                ("sans-serif", 16).into_font(),
            ))?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_face<DB: DrawingBackend>(
        area: &DrawingArea<DB, plotters::coord::Shift>,
        face: Face,
        grid: &Histogram2D,
        max_pe: f64,
    ) -> Result<(), Box<dyn Error>>
    where
        DB::ErrorType: 'static,
    {
        let (h_label, v_label) = face.axis_labels();
        let (xa, ya) = (grid.x_axis, grid.y_axis);
        let mut chart = ChartBuilder::on(area)
            .caption(face.label(), ("sans-serif", 16))
            .margin(5)
            .x_label_area_size(25)
            .y_label_area_size(40)
            .build_cartesian_2d(xa.lo..xa.hi, ya.lo..ya.hi)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(h_label)
            .y_desc(v_label)
            .draw()?;

        chart.draw_series(grid.nonzero_bins().map(|(ix, iy, pe)| {
            let (x0, y0) = (xa.bin_low_edge(ix), ya.bin_low_edge(iy));
            let (x1, y1) = (x0 + xa.width(), y0 + ya.width());
            let t = if max_pe > 0.0 { pe / max_pe } else { 0.0 };
            Rectangle::new([(x0, y0), (x1, y1)], color_map(t).filled())
        }))?;
        Ok(())
    }

    /// Blue to grey to yellow ramp for `t` in `[0, 1]`.
    fn color_map(t: f64) -> RGBColor {
        const STOPS: [(f64, [f64; 3]); 3] = [
            (0.0, [0.0, 32.0, 76.0]),
            (0.5, [124.0, 123.0, 120.0]),
            (1.0, [255.0, 234.0, 70.0]),
        ];
        let t = t.clamp(0.0, 1.0);
        let (lo, hi) = if t <= STOPS[1].0 {
            (STOPS[0], STOPS[1])
        } else {
            (STOPS[1], STOPS[2])
        };
        let f = (t - lo.0) / (hi.0 - lo.0);
        let c = |k: usize| (lo.1[k] + f * (hi.1[k] - lo.1[k])).round() as u8;
        RGBColor(c(0), c(1), c(2))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_color_map_endpoints() {
            assert_eq!(color_map(0.0), RGBColor(0, 32, 76));
            assert_eq!(color_map(1.0), RGBColor(255, 234, 70));
            assert_eq!(color_map(2.0), color_map(1.0));
            assert_eq!(color_map(-1.0), color_map(0.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PhotonCounts, SensorTable};
    use crate::Vector3;

    /// 2 m cube (in mm) with one sensor centred on each face.
    fn cube() -> GeometryClassifier {
        let table = SensorTable {
            ids: Some(vec![1, 2, 3, 4, 5, 6]),
            x: Some(vec![0.0, 0.0, 1000.0, -1000.0, 0.0, 0.0]),
            y: Some(vec![0.0, 0.0, 0.0, 0.0, 1000.0, -1000.0]),
            z: Some(vec![1000.0, -1000.0, 0.0, 0.0, 0.0, 0.0]),
        };
        let mut g = GeometryClassifier::default();
        assert!(g.load(&table));
        g
    }

    fn event() -> SimRecord {
        SimRecord {
            particle_count: Some(6),
            vertex: Some(Vector3::new(1500.0, -250.0, 0.0)),
            photons: Some(PhotonCounts {
                scintillation: 1000.0,
                cherenkov: 50.0,
                reemitted: 3.0,
            }),
            pdgs: vec![11, 2212, 22, 13, 211, 2112],
            kes: vec![5.0, 40.0, 1.0, 300.0, 20.0, f64::NAN],
            us: vec![0.0; 6],
            vs: vec![0.0; 6],
            ws: vec![1.0; 6],
            mc_pmt_id: vec![1, 3, 3, 6],
            mc_pmt_npe: vec![2, 4, 1, 7],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_fills_faces() {
        let d = EventDisplay::build(42, &event(), &cube(), 1e-3, 4).unwrap();
        assert_eq!(d.faces.len(), 6);
        assert_eq!(d.faces[&Face::ZPlus].integral(), 2.0);
        assert_eq!(d.faces[&Face::XPlus].integral(), 5.0);
        assert_eq!(d.faces[&Face::YMinus].integral(), 7.0);
        assert_eq!(d.faces[&Face::ZMinus].integral(), 0.0);
        let total: f64 = d.faces.values().map(Histogram2D::integral).sum();
        assert_eq!(total, 14.0);
    }

    #[test]
    fn test_text_panel() {
        let d = EventDisplay::build(42, &event(), &cube(), 1e-3, 4).unwrap();
        let l = &d.lines;
        assert_eq!(l[0], "Event 42");
        assert_eq!(l[1], "True total deposited energy = 0.37 GeV");
        assert!(l[2].starts_with("True number of photons = 1.053e3"), "{}", l[2]);
        assert_eq!(l[6], "True number of collected PEs = 14");
        assert_eq!(l[7], "Pos = (1.50, -0.25, 0.00) m, Total particles = 6:");
        // Leading particle is the 300 MeV muon.
        assert!(l[8].starts_with(" - mu- (PDG=13)"), "{}", l[8]);
        assert_eq!(l[9], "   True KE = 300.00 MeV");
        assert_eq!(l.last().unwrap(), " + 2 particles not listed");
        assert_eq!(l.len(), 8 + 2 * 4 + 1);
    }

    #[test]
    fn test_text_panel_prefers_particle_position() {
        let mut ev = event();
        ev.xs = vec![2000.0; 6];
        ev.ys = vec![500.0; 6];
        ev.zs = vec![-1000.0; 6];
        let d = EventDisplay::build(42, &ev, &cube(), 1e-3, 4).unwrap();
        assert_eq!(d.lines[7], "Pos = (2.00, 0.50, -1.00) m, Total particles = 6:");
    }

    #[test]
    fn test_skip_reasons() {
        let unloaded = GeometryClassifier::default();
        assert_eq!(
            EventDisplay::build(1, &event(), &unloaded, 1e-3, 4).unwrap_err(),
            DisplaySkip::GeometryUnloaded
        );

        let mut no_pe = event();
        no_pe.mc_pmt_npe.clear();
        assert_eq!(
            EventDisplay::build(1, &no_pe, &cube(), 1e-3, 4).unwrap_err(),
            DisplaySkip::NoPhotoelectrons
        );

        let mut mismatched = event();
        mismatched.mc_pmt_id.pop();
        assert_eq!(
            EventDisplay::build(1, &mismatched, &cube(), 1e-3, 4).unwrap_err(),
            DisplaySkip::LengthMismatch { ids: 3, npe: 4 }
        );
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_render_writes_svg() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = EventRenderer::new(tmp.path().join("Plots")).unwrap();
        let d = EventDisplay::build(7, &event(), &cube(), 1e-3, 4).unwrap();
        let path = renderer.render(&d).unwrap();
        assert_eq!(path.file_name().unwrap(), "event_000007.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
