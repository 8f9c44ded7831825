//! Fixed-range binned accumulators.
//!
//! Bin `i` of an [`Axis`] with `n` bins over `[lo, hi)` covers
//! `[lo + i·w, lo + (i+1)·w)` with `w = (hi − lo) / n`. Values below `lo` go to the
//! underflow bin, values at or above `hi` go to the overflow bin. NaN is counted
//! as an entry but lands in no bin.
//!
//! Storage layout is `[underflow, bin 0, ..., bin n−1, overflow]` per axis; 2D
//! histograms store `(nx + 2) · (ny + 2)` cells row-major in y.

use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("cannot add histogram '{other}' to '{name}': binning differs")]
    BinningMismatch { name: String, other: String },
}

/// Uniform binning along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct Axis {
    pub bins: u32,
    pub lo: f64,
    pub hi: f64,
}

impl Axis {
    pub const fn new(bins: u32, lo: f64, hi: f64) -> Self {
        Axis { bins, lo, hi }
    }

    pub fn width(&self) -> f64 {
        (self.hi - self.lo) / self.bins as f64
    }

    /// Number of storage cells including under/overflow.
    fn cells(&self) -> usize {
        self.bins as usize + 2
    }

    /// Storage cell for `v`: 0 is underflow, `bins + 1` is overflow, `None` for NaN.
    fn cell(&self, v: f64) -> Option<usize> {
        if v.is_nan() {
            return None;
        }
        if v < self.lo {
            return Some(0);
        }
        if v >= self.hi {
            return Some(self.bins as usize + 1);
        }
        let i = ((v - self.lo) * self.bins as f64 / (self.hi - self.lo)) as usize;
        // Guards the last bin against rounding right below `hi`.
        Some(i.min(self.bins as usize - 1) + 1)
    }

    /// Lower edge of in-range bin `i`.
    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.lo + i as f64 * self.width()
    }

    /// Center of in-range bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.lo + (i as f64 + 0.5) * self.width()
    }

    /// In-range bin index for `v`, if it falls inside `[lo, hi)`.
    pub fn find_bin(&self, v: f64) -> Option<usize> {
        match self.cell(v) {
            Some(c) if c >= 1 && c <= self.bins as usize => Some(c - 1),
            _ => None,
        }
    }
}

// ── 1D ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Histogram1D {
    pub name: String,
    pub axis: Axis,
    counts: Vec<f64>,
    entries: u64,
}

impl Histogram1D {
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        Histogram1D {
            name: name.into(),
            axis,
            counts: vec![0.0; axis.cells()],
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        if let Some(c) = self.axis.cell(x) {
            self.counts[c] += weight;
        }
    }

    /// Number of fill calls, including NaN and out-of-range values.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Content of in-range bin `i`.
    pub fn bin_content(&self, i: usize) -> f64 {
        self.counts[i + 1]
    }

    /// Contents of the in-range bins.
    pub fn contents(&self) -> &[f64] {
        &self.counts[1..self.counts.len() - 1]
    }

    pub fn underflow(&self) -> f64 {
        self.counts[0]
    }

    pub fn overflow(&self) -> f64 {
        self.counts[self.counts.len() - 1]
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.contents().iter().sum()
    }

    /// Mean of the in-range distribution using bin centers.
    pub fn mean(&self) -> Option<f64> {
        let total = self.integral();
        if total == 0.0 {
            return None;
        }
        let weighted: f64 = self
            .contents()
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.axis.bin_center(i))
            .sum();
        Some(weighted / total)
    }

    /// Add another histogram's contents into this one.
    pub fn add(&mut self, other: &Histogram1D) -> Result<(), HistogramError> {
        if self.axis != other.axis {
            return Err(HistogramError::BinningMismatch {
                name: self.name.clone(),
                other: other.name.clone(),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.entries += other.entries;
        Ok(())
    }
}

// ── 2D ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Histogram2D {
    pub name: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    counts: Vec<f64>,
    entries: u64,
}

impl Histogram2D {
    pub fn new(name: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        Histogram2D {
            name: name.into(),
            x_axis,
            y_axis,
            counts: vec![0.0; x_axis.cells() * y_axis.cells()],
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        self.entries += 1;
        if let (Some(cx), Some(cy)) = (self.x_axis.cell(x), self.y_axis.cell(y)) {
            let idx = cy * self.x_axis.cells() + cx;
            self.counts[idx] += weight;
        }
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Content of in-range bin `(ix, iy)`.
    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        self.counts[(iy + 1) * self.x_axis.cells() + ix + 1]
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.nonzero_bins().map(|(_, _, c)| c).sum()
    }

    /// In-range bins with non-zero content as `(ix, iy, content)`.
    pub fn nonzero_bins(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let nx = self.x_axis.bins as usize;
        let ny = self.y_axis.bins as usize;
        (0..ny).flat_map(move |iy| {
            (0..nx).filter_map(move |ix| {
                let c = self.bin_content(ix, iy);
                (c != 0.0).then_some((ix, iy, c))
            })
        })
    }

    /// Largest in-range bin content (0 if empty).
    pub fn max_content(&self) -> f64 {
        self.nonzero_bins().map(|(_, _, c)| c).fold(0.0, f64::max)
    }

    pub fn add(&mut self, other: &Histogram2D) -> Result<(), HistogramError> {
        if self.x_axis != other.x_axis || self.y_axis != other.y_axis {
            return Err(HistogramError::BinningMismatch {
                name: self.name.clone(),
                other: other.name.clone(),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.entries += other.entries;
        Ok(())
    }
}
