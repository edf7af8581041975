//! EuRoC MAV ground-truth loader.
//!
//! Reads `state_groundtruth_estimate0/data.csv` (or any CSV in that format)
//! into timestamped poses used to drive a replay of the trajectory.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use nalgebra::Vector3;
use tracing::warn;

use crate::geometry::SE3;
use crate::map::Timestamp;

/// Relative path of the ground-truth CSV inside a `mav0` directory.
const GROUNDTRUTH_CSV: &str = "state_groundtruth_estimate0/data.csv";

#[derive(Debug, Clone)]
pub struct GroundTruthEntry {
    pub timestamp: Timestamp,
    /// Body pose in the motion-capture frame (Z-up).
    pub pose: SE3,
}

#[derive(Debug)]
pub struct EurocGroundTruth {
    pub entries: Vec<GroundTruthEntry>,
}

impl EurocGroundTruth {
    /// Load from a `mav0` directory or directly from a CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let csv_path = resolve_csv(path.as_ref());
        let file = std::fs::File::open(&csv_path)
            .with_context(|| format!("Failed to open {}", csv_path.display()))?;
        let entries = parse_groundtruth(file)
            .with_context(|| format!("Failed to parse {}", csv_path.display()))?;
        if entries.is_empty() {
            bail!("No ground truth entries in {}", csv_path.display());
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean sample rate in Hz, from first and last timestamps.
    pub fn rate_hz(&self) -> Option<f64> {
        let first = self.entries.first()?.timestamp;
        let last = self.entries.last()?.timestamp;
        let span = last.secs_since(first);
        (span > 0.0).then(|| (self.entries.len() - 1) as f64 / span)
    }

    /// Keep every `step`-th entry (EuRoC ground truth is 200 Hz).
    pub fn decimate(&mut self, step: usize) {
        if step <= 1 {
            return;
        }
        self.entries = self
            .entries
            .iter()
            .step_by(step)
            .cloned()
            .collect();
    }
}

fn resolve_csv(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(GROUNDTRUTH_CSV)
    } else {
        path.to_path_buf()
    }
}

/// Parse ground-truth rows; malformed or short rows are skipped.
pub fn parse_groundtruth<R: Read>(reader: R) -> Result<Vec<GroundTruthEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let mut entries: Vec<GroundTruthEntry> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        // CSV format: timestamp, p_RS_R_x, p_RS_R_y, p_RS_R_z, q_RS_w, q_RS_x, q_RS_y, q_RS_z,
        //             ... (velocity and biases ignored)
        if rec.len() < 8 {
            continue;
        }
        let ts: u64 = rec[0].trim().parse()?;
        if let Some(prev) = entries.last() {
            if prev.timestamp.as_nanos() >= ts {
                warn!("Skipping out-of-order ground truth row at {}", ts);
                continue;
            }
        }

        let position = Vector3::new(
            rec[1].trim().parse()?,
            rec[2].trim().parse()?,
            rec[3].trim().parse()?,
        );

        // Orientation quaternion (q_RS_w/x/y/z) - w-first format
        let qw: f64 = rec[4].trim().parse()?;
        let qx: f64 = rec[5].trim().parse()?;
        let qy: f64 = rec[6].trim().parse()?;
        let qz: f64 = rec[7].trim().parse()?;
        let pose = SE3::from_quaternion(qw, qx, qy, qz, position);

        entries.push(GroundTruthEntry {
            timestamp: Timestamp::from_nanos(ts),
            pose,
        });
    }
    Ok(entries)
}
