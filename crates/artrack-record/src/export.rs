//! Snapshot and delimited-text export of a trimmed session.
//!
//! Export is split in two steps so the frame loop is never blocked on I/O:
//! [`ExportSnapshot::capture`] copies the in-window samples out of the
//! registry synchronously, and the snapshot is written afterwards. A
//! recording restart after the capture cannot change what gets written.
//!
//! Row layout (one sample per line, markers in registration order):
//!
//! ```text
//! relative_time,center_x,center_y,corner0_x,corner0_y,corner1_x,corner1_y,corner2_x,corner2_y,corner3_x,corner3_y
//! ```
//!
//! `relative_time` is seconds since the trim window start. A leading
//! `marker_id` column and the header line are controlled by
//! [`ExportOptions`].

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use artrack_core::{MarkerId, MarkerSample, CORNER_COUNT};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::registry::MarkerRegistry;
use crate::trim::TrimBounds;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("no marker data available to save")]
    NoDataAvailable,
    #[error("failed to write export to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn default_delimiter() -> char {
    ','
}

fn default_header() -> bool {
    true
}

/// Formatting switches for the export artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Emit a column-name line before the data rows.
    #[serde(default = "default_header")]
    pub header: bool,
    /// Prefix every row with the marker id.
    #[serde(default)]
    pub include_marker_id: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            header: default_header(),
            include_marker_id: false,
        }
    }
}

impl ExportOptions {
    /// Column names in output order.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = Vec::with_capacity(3 + 2 * CORNER_COUNT);
        if self.include_marker_id {
            cols.push("marker_id".to_string());
        }
        cols.extend(["relative_time", "center_x", "center_y"].map(String::from));
        for k in 0..CORNER_COUNT {
            cols.push(format!("corner{k}_x"));
            cols.push(format!("corner{k}_y"));
        }
        cols
    }
}

/// In-window samples of one marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: MarkerId,
    pub samples: Vec<MarkerSample>,
}

/// Result of a successful export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows written, header excluded.
    pub rows: usize,
    /// Markers that contributed at least one row.
    pub markers: usize,
}

/// Immutable copy of everything an export will write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    bounds: Option<TrimBounds>,
    tracks: Vec<TrackSnapshot>,
}

impl ExportSnapshot {
    /// Copy the samples inside `bounds` out of the registry.
    ///
    /// `bounds` is `None` when no session has been stopped yet; the snapshot
    /// is then empty. Fails only if the registry holds no marker at all.
    pub fn capture(
        registry: &MarkerRegistry,
        bounds: Option<TrimBounds>,
    ) -> Result<Self, ExportError> {
        if registry.is_empty() {
            return Err(ExportError::NoDataAvailable);
        }
        let tracks = match bounds {
            Some(b) => registry
                .iter()
                .filter(|r| !r.history().is_empty())
                .map(|r| TrackSnapshot {
                    id: r.id(),
                    samples: r
                        .history()
                        .iter()
                        .filter(|s| b.contains(s.timestamp))
                        .copied()
                        .collect(),
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(Self { bounds, tracks })
    }

    pub fn bounds(&self) -> Option<TrimBounds> {
        self.bounds
    }

    /// One entry per marker with recorded history, possibly with no samples.
    pub fn tracks(&self) -> &[TrackSnapshot] {
        &self.tracks
    }

    pub fn row_count(&self) -> usize {
        self.tracks.iter().map(|t| t.samples.len()).sum()
    }

    pub fn contributing_markers(&self) -> usize {
        self.tracks.iter().filter(|t| !t.samples.is_empty()).count()
    }

    /// Render the artifact into a string.
    pub fn to_delimited(&self, opts: &ExportOptions) -> String {
        let mut out = String::new();
        let d = opts.delimiter;
        if opts.header {
            let cols = opts.columns();
            for (i, col) in cols.iter().enumerate() {
                if i > 0 {
                    out.push(d);
                }
                out.push_str(col);
            }
            out.push('\n');
        }
        let origin = self.bounds.map(|b| b.begin).unwrap_or(0.0);
        for track in &self.tracks {
            for s in &track.samples {
                if opts.include_marker_id {
                    let _ = write!(out, "{}{d}", track.id);
                }
                let _ = write!(
                    out,
                    "{}{d}{}{d}{}",
                    s.timestamp - origin,
                    s.center.x,
                    s.center.y
                );
                for c in &s.corners {
                    let _ = write!(out, "{d}{}{d}{}", c.x, c.y);
                }
                out.push('\n');
            }
        }
        out
    }

    /// Write the artifact to any writer. Returns the number of data rows.
    pub fn write_to<W: Write>(&self, mut writer: W, opts: &ExportOptions) -> io::Result<usize> {
        writer.write_all(self.to_delimited(opts).as_bytes())?;
        writer.flush()?;
        Ok(self.row_count())
    }

    /// Write the artifact to `path`, replacing any existing file.
    ///
    /// The data goes to a temporary file next to `path` that is renamed into
    /// place, so a failed save never leaves a partial file behind.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        opts: &ExportOptions,
    ) -> Result<ExportSummary, ExportError> {
        let path = path.as_ref();
        let io_err = |source: io::Error| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        self.write_to(&mut tmp, opts).map_err(io_err)?;
        tmp.persist(path).map_err(|err| io_err(err.error))?;
        let summary = ExportSummary {
            path: path.to_path_buf(),
            rows: self.row_count(),
            markers: self.contributing_markers(),
        };
        log::info!(
            "data saved to {} ({} rows, {} markers)",
            summary.path.display(),
            summary.rows,
            summary.markers
        );
        Ok(summary)
    }
}

/// File name offered to the save dialog: `<unix-seconds>.csv`.
pub fn suggested_file_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}.csv")
}
