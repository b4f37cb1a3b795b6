//! Punch ingestion from the biometric device feed.

use std::collections::BTreeSet;

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{HrError, HrResult};
use crate::models::{PunchEvent, RawPunchRecord};
use crate::store::Store;

use super::normalizer::to_instant;

/// A source of raw device records.
pub trait DeviceFeed: Send + Sync {
    /// Fetches the records currently available on the device.
    ///
    /// Returns `UpstreamUnavailable` when the device cannot be reached.
    fn fetch(&self) -> HrResult<Vec<RawPunchRecord>>;
}

/// One employee's local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EmployeeDay {
    /// The employee.
    pub emp_id: String,
    /// The local date.
    pub date: NaiveDate,
}

/// Outcome of ingesting a batch of raw records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records stored as new punches.
    pub accepted: usize,
    /// Records that repeated an already stored punch.
    pub duplicates: usize,
    /// Records whose device user maps to no employee.
    pub unmatched: usize,
    /// Records whose timestamp could not be parsed.
    pub invalid: usize,
    /// Days that gained at least one punch, sorted.
    pub touched: Vec<EmployeeDay>,
}

/// Normalizes and stores raw device records.
#[derive(Clone)]
pub struct PunchIngestor {
    store: Store,
    offset: FixedOffset,
}

impl PunchIngestor {
    /// Creates an ingestor interpreting device times in `offset`.
    pub fn new(store: Store, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    /// Ingests a batch in one transaction.
    ///
    /// Bad records are counted and skipped; they never fail the batch.
    pub fn ingest(&self, records: &[RawPunchRecord]) -> HrResult<IngestReport> {
        let report = self.store.write(|tx| {
            let mut report = IngestReport::default();
            let mut touched = BTreeSet::new();

            for record in records {
                let Some(emp_id) = tx.emp_id_for_device_user(&record.device_user_id)? else {
                    debug!(device_user_id = %record.device_user_id, "no employee for device user");
                    report.unmatched += 1;
                    continue;
                };
                let instant = match to_instant(&record.timestamp, self.offset) {
                    Ok(instant) => instant,
                    Err(e) => {
                        warn!(
                            device_id = %record.device_id,
                            timestamp = %record.timestamp,
                            error = %e,
                            "skipping unparseable punch"
                        );
                        report.invalid += 1;
                        continue;
                    }
                };
                let punch = PunchEvent {
                    emp_id,
                    instant,
                    device_id: record.device_id.clone(),
                };
                match tx.insert_punch(&punch) {
                    Ok(()) => {
                        report.accepted += 1;
                        touched.insert(EmployeeDay {
                            date: instant.with_timezone(&self.offset).date_naive(),
                            emp_id: punch.emp_id,
                        });
                    }
                    Err(HrError::DuplicatePunch { .. }) => report.duplicates += 1,
                    Err(e) => return Err(e),
                }
            }

            report.touched = touched.into_iter().collect();
            Ok(report)
        })?;

        info!(
            accepted = report.accepted,
            duplicates = report.duplicates,
            unmatched = report.unmatched,
            invalid = report.invalid,
            "punch batch ingested"
        );
        Ok(report)
    }

    /// Pulls from `feed` and ingests the result.
    ///
    /// An unreachable device yields an empty report; the next sync picks up
    /// where this one would have.
    pub fn sync_from_feed(&self, feed: &dyn DeviceFeed) -> HrResult<IngestReport> {
        match feed.fetch() {
            Ok(records) => self.ingest(&records),
            Err(HrError::UpstreamUnavailable { service, message }) => {
                warn!(%service, %message, "device feed unavailable, skipping sync");
                Ok(IngestReport::default())
            }
            Err(e) => Err(e),
        }
    }
}
