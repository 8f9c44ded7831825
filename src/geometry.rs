//! Sensor geometry: assigns each sensor to one face of the detector's
//! bounding box and projects it onto that face for 2D display.
//!
//! Algorithm:
//!
//! 1. **Load** sensor positions, convert them to metres and track the running
//!    min/max per axis. The resulting bounding box defines the six wall planes.
//! 2. **Classify** each sensor against the walls with a per-axis tolerance of
//!    `max(1e-3 · span, 1e-6)`, testing faces in the fixed order
//!    `+Z, −Z, +X, −X, +Y, −Y`. The first match wins, so edge and corner sensors
//!    land on exactly one face. Sensors on no wall belong to no face.
//! 3. **Project** onto face-local axes: `(y, x)` for ±Z, `(y, z)` for ±X and
//!    `(x, z)` for ±Y.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::histogram::{Axis, Histogram2D};
use crate::store::SensorTable;
use crate::Vector3;

/// One wall of the detector's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Face {
    ZPlus,
    ZMinus,
    XPlus,
    XMinus,
    YPlus,
    YMinus,
}

impl Face {
    /// Classification precedence: a sensor within tolerance of several walls
    /// belongs to the first one listed here.
    pub const PRIORITY: [Face; 6] = [
        Face::ZPlus,
        Face::ZMinus,
        Face::XPlus,
        Face::XMinus,
        Face::YPlus,
        Face::YMinus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Face::ZPlus => "+Z (top)",
            Face::ZMinus => "-Z (bottom)",
            Face::XPlus => "+X (right side)",
            Face::XMinus => "-X (left side)",
            Face::YPlus => "+Y (downstream)",
            Face::YMinus => "-Y (upstream)",
        }
    }

    /// Horizontal and vertical axis names of the face projection.
    pub fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            Face::ZPlus | Face::ZMinus => ("y [m]", "x [m]"),
            Face::XPlus | Face::XMinus => ("y [m]", "z [m]"),
            Face::YPlus | Face::YMinus => ("x [m]", "z [m]"),
        }
    }

    /// Display bin counts of the face projection (horizontal, vertical).
    pub fn grid_bins(self) -> (u32, u32) {
        match self {
            Face::ZPlus | Face::ZMinus => (194, 56),
            Face::XPlus | Face::XMinus => (194, 50),
            Face::YPlus | Face::YMinus => (56, 50),
        }
    }

    /// Project a 3D point onto this face's local axes.
    pub fn project_point(self, p: &Vector3) -> (f64, f64) {
        match self {
            Face::ZPlus | Face::ZMinus => (p.y, p.x),
            Face::XPlus | Face::XMinus => (p.y, p.z),
            Face::YPlus | Face::YMinus => (p.x, p.z),
        }
    }
}

/// Sensor ids grouped by face. Every face has an entry, possibly empty.
pub type FaceMap = BTreeMap<Face, Vec<i32>>;

/// Axis-aligned box spanned by the sensors, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox {
    fn from_point(p: Vector3) -> Self {
        BoundingBox { min: p, max: p }
    }

    fn extend(&mut self, p: &Vector3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Per-axis wall tolerance.
    pub fn tolerance(&self) -> Vector3 {
        (self.max - self.min).map(|span| (1e-3 * span).max(1e-6))
    }

    /// Face whose wall plane `p` lies on, honoring [`Face::PRIORITY`].
    pub fn face_of(&self, p: &Vector3) -> Option<Face> {
        let tol = self.tolerance();
        Face::PRIORITY.into_iter().find(|face| {
            let (value, wall, tol) = match face {
                Face::ZPlus => (p.z, self.max.z, tol.z),
                Face::ZMinus => (p.z, self.min.z, tol.z),
                Face::XPlus => (p.x, self.max.x, tol.x),
                Face::XMinus => (p.x, self.min.x, tol.x),
                Face::YPlus => (p.y, self.max.y, tol.y),
                Face::YMinus => (p.y, self.min.y, tol.y),
            };
            (value - wall).abs() <= tol
        })
    }

    /// Shortest distance from `p` to any of the six walls. Negative outside.
    pub fn distance_to_wall(&self, p: &Vector3) -> f64 {
        let lo = p - self.min;
        let hi = self.max - p;
        lo.min().min(hi.min())
    }

    /// Range of a face's projection axes as `((h_lo, h_hi), (v_lo, v_hi))`.
    pub fn face_extent(&self, face: Face) -> ((f64, f64), (f64, f64)) {
        let (h_lo, v_lo) = face.project_point(&self.min);
        let (h_hi, v_hi) = face.project_point(&self.max);
        ((h_lo, h_hi), (v_lo, v_hi))
    }
}

/// Sensor positions and their face assignment for one run.
///
/// Read-only after [`GeometryClassifier::load`]; a loaded classifier can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct GeometryClassifier {
    length_scale: f64,
    sensors: BTreeMap<i32, Vector3>,
    bounds: Option<BoundingBox>,
    faces: FaceMap,
    assigned: BTreeMap<i32, Face>,
}

impl Default for GeometryClassifier {
    fn default() -> Self {
        GeometryClassifier::new(1e-3)
    }
}

impl GeometryClassifier {
    /// `length_scale` converts the table's native unit to metres (1e-3 for mm).
    pub fn new(length_scale: f64) -> Self {
        GeometryClassifier {
            length_scale,
            sensors: BTreeMap::new(),
            bounds: None,
            faces: FaceMap::new(),
            assigned: BTreeMap::new(),
        }
    }

    /// Load sensor positions. Returns false, leaving the classifier unloaded,
    /// if a column is missing, columns differ in length, the table is empty or a
    /// coordinate is not finite.
    pub fn load(&mut self, table: &SensorTable) -> bool {
        self.unload();

        let (Some(ids), Some(xs), Some(ys), Some(zs)) = (&table.ids, &table.x, &table.y, &table.z)
        else {
            warn!("Sensor table lacks pmtId/pmtX/pmtY/pmtZ; geometry unavailable");
            return false;
        };
        if xs.len() != ids.len() || ys.len() != ids.len() || zs.len() != ids.len() {
            warn!("Sensor table columns have inconsistent lengths; geometry unavailable");
            return false;
        }
        if ids.is_empty() {
            warn!("Sensor table is empty; geometry unavailable");
            return false;
        }

        let mut sensors = BTreeMap::new();
        let mut bounds: Option<BoundingBox> = None;
        for (i, &id) in ids.iter().enumerate() {
            let p = Vector3::new(xs[i], ys[i], zs[i]) * self.length_scale;
            if !p.iter().all(|v| v.is_finite()) {
                warn!("Sensor {} has a non-finite position; geometry unavailable", id);
                return false;
            }
            match bounds.as_mut() {
                Some(b) => b.extend(&p),
                None => bounds = Some(BoundingBox::from_point(p)),
            }
            sensors.insert(id, p);
        }
        let Some(bounds) = bounds else {
            return false;
        };

        let mut faces: FaceMap = Face::PRIORITY.iter().map(|&f| (f, Vec::new())).collect();
        let mut assigned = BTreeMap::new();
        for (&id, p) in &sensors {
            if let Some(face) = bounds.face_of(p) {
                faces.entry(face).or_default().push(id);
                assigned.insert(id, face);
            }
        }

        info!(
            "Geometry: loaded {} sensors, x:[{:.3},{:.3}] y:[{:.3},{:.3}] z:[{:.3},{:.3}] m, {} on walls",
            sensors.len(),
            bounds.min.x,
            bounds.max.x,
            bounds.min.y,
            bounds.max.y,
            bounds.min.z,
            bounds.max.z,
            assigned.len()
        );

        self.sensors = sensors;
        self.bounds = Some(bounds);
        self.faces = faces;
        self.assigned = assigned;
        true
    }

    fn unload(&mut self) {
        self.sensors.clear();
        self.bounds = None;
        self.faces.clear();
        self.assigned.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Sensor position in metres.
    pub fn position(&self, id: i32) -> Option<&Vector3> {
        self.sensors.get(&id)
    }

    /// Face of one sensor, `None` for unknown ids and sensors on no wall.
    pub fn classify(&self, id: i32) -> Option<Face> {
        self.assigned.get(&id).copied()
    }

    /// Face assignment of every loaded sensor. Empty when unloaded.
    pub fn classify_all(&self) -> FaceMap {
        self.faces.clone()
    }

    pub fn face_members(&self, face: Face) -> &[i32] {
        self.faces.get(&face).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Face-local coordinates of a sensor in metres.
    pub fn project(&self, face: Face, id: i32) -> Option<(f64, f64)> {
        self.position(id).map(|p| face.project_point(p))
    }

    /// Distance in metres from `point_m` to the nearest wall.
    pub fn distance_to_wall(&self, point_m: &Vector3) -> Option<f64> {
        self.bounds.map(|b| b.distance_to_wall(point_m))
    }

    /// Empty display grid of a face, spanning the bounding box.
    pub fn face_grid(&self, face: Face, name: impl Into<String>) -> Option<Histogram2D> {
        let bounds = self.bounds?;
        let ((h_lo, h_hi), (v_lo, v_hi)) = bounds.face_extent(face);
        let (nh, nv) = face.grid_bins();
        // Flat detectors still get a non-degenerate axis.
        let widen = |lo: f64, hi: f64| if hi - lo > 1e-9 { hi } else { lo + 1.0 };
        Some(Histogram2D::new(
            name,
            Axis::new(nh, h_lo, widen(h_lo, h_hi)),
            Axis::new(nv, v_lo, widen(v_lo, v_hi)),
        ))
    }
}
