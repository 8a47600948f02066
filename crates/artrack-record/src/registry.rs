//! Persistent marker identities and their per-session history.

use artrack_core::{Detection, MalformedDetection, MarkerId, MarkerSample};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Everything known about one marker identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    id: MarkerId,
    last: MarkerSample,
    history: Vec<MarkerSample>,
}

impl MarkerRecord {
    fn new(id: MarkerId, last: MarkerSample) -> Self {
        Self {
            id,
            last,
            history: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Most recent observation, recorded or not.
    #[inline]
    pub fn last_sample(&self) -> &MarkerSample {
        &self.last
    }

    #[inline]
    pub fn last_seen(&self) -> f64 {
        self.last.timestamp
    }

    /// Samples committed while the current session was recording, oldest first.
    #[inline]
    pub fn history(&self) -> &[MarkerSample] {
        &self.history
    }

    fn is_stale(&self, now: f64, timeout: f64) -> bool {
        now - self.last.timestamp > timeout
    }
}

/// Outcome of feeding one frame of detections into the registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateReport {
    /// Detections that updated a record (duplicates within the batch included).
    pub applied: usize,
    /// Identities seen for the first time in this frame.
    pub created: Vec<MarkerId>,
    /// Detections skipped because of a wrong corner count.
    pub malformed: Vec<MalformedDetection>,
}

/// Set of marker identities currently known, in registration order.
///
/// Sizes are tens of markers, so lookups are a linear scan over a `Vec`;
/// this keeps registration order stable for export without an extra index.
#[derive(Clone, Debug, Default)]
pub struct MarkerRegistry {
    records: Vec<MarkerRecord>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one frame of detections stamped with `now`.
    ///
    /// Every valid detection overwrites the record's last sample. When
    /// `record` is set the same sample is appended to the history. A batch
    /// that mentions an id twice keeps the last one: the history still grows
    /// by exactly one sample for that frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn update(&mut self, detections: &[Detection], now: f64, record: bool) -> UpdateReport {
        let mut report = UpdateReport::default();
        let mut written: Vec<MarkerId> = Vec::with_capacity(detections.len());

        for det in detections {
            let sample = match det.to_sample(now) {
                Ok(sample) => sample,
                Err(err) => {
                    log::warn!("skipping detection: {err}");
                    report.malformed.push(err);
                    continue;
                }
            };

            let duplicate = written.contains(&det.id);
            let record_ref = match self.position(det.id) {
                Some(idx) => &mut self.records[idx],
                None => {
                    log::debug!("new marker {} at t={now:.3}", det.id);
                    report.created.push(det.id);
                    self.records.push(MarkerRecord::new(det.id, sample));
                    let last = self.records.len() - 1;
                    &mut self.records[last]
                }
            };

            record_ref.last = sample;
            if record {
                match record_ref.history.last_mut() {
                    Some(prev) if duplicate && prev.timestamp == now => *prev = sample,
                    Some(prev) if prev.timestamp > now => {
                        log::warn!(
                            "marker {}: frame time {now:.3} precedes last sample {:.3}, not recorded",
                            det.id,
                            prev.timestamp
                        );
                    }
                    _ => record_ref.history.push(sample),
                }
            }

            if !duplicate {
                written.push(det.id);
            }
            report.applied += 1;
        }

        report
    }

    /// Remove every record not seen for more than `timeout` seconds.
    ///
    /// Returns the evicted ids in registration order.
    pub fn evict_stale(&mut self, now: f64, timeout: f64) -> Vec<MarkerId> {
        self.evict_stale_where(now, timeout, |_| false)
    }

    /// Like [`MarkerRegistry::evict_stale`], but records for which `keep`
    /// returns `true` survive even when stale.
    pub fn evict_stale_where<F>(&mut self, now: f64, timeout: f64, keep: F) -> Vec<MarkerId>
    where
        F: Fn(&MarkerRecord) -> bool,
    {
        let mut evicted = Vec::new();
        self.records.retain(|r| {
            if r.is_stale(now, timeout) && !keep(r) {
                evicted.push(r.id);
                false
            } else {
                true
            }
        });
        if !evicted.is_empty() {
            log::debug!("evicted stale markers {evicted:?} at t={now:.3}");
        }
        evicted
    }

    /// Drop the history of every record; last samples are kept.
    pub fn clear_history(&mut self) {
        for r in &mut self.records {
            r.history.clear();
        }
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.position(id).is_some()
    }

    /// Records in registration order.
    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of history samples across all records.
    pub fn history_len(&self) -> usize {
        self.records.iter().map(|r| r.history.len()).sum()
    }

    fn position(&self, id: MarkerId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}
