//! Bulk removal of expired records.
//!
//! Expiry is normally lazy: a record is only removed when someone tries to
//! read it. Records nobody reads again stay on disk until [`sweep`] runs.

use std::ops::ControlFlow;

use cellar_store::Bucket;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::PayloadCodec;
use crate::error::Result;
use crate::record::SessionRecord;
use crate::store::SessionStore;

/// Outcome of one [`sweep`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Records examined.
    pub scanned: usize,
    /// Expired records deleted.
    pub removed: usize,
    /// Records that failed to decode. These are left in place.
    pub corrupt: usize,
}

/// Delete every record that is expired at the store's current time.
///
/// Each deletion re-checks expiry inside its own write transaction, so a
/// session saved while the sweep runs is kept.
pub fn sweep<B: Bucket, P: PayloadCodec>(store: &SessionStore<B, P>) -> Result<SweepReport> {
    let now = store.now();
    let mut report = SweepReport::default();
    let mut expired = Vec::new();

    store.bucket().for_each(&mut |key, value| {
        report.scanned += 1;
        match SessionRecord::decode(value) {
            Ok(record) if record.is_expired(now) => expired.push(key.to_vec()),
            Ok(_) => {}
            Err(e) => {
                report.corrupt += 1;
                warn!(id = %String::from_utf8_lossy(key), error = %e, "Skipping unreadable session record");
            }
        }
        ControlFlow::Continue(())
    })?;

    for id in expired {
        if store.remove_expired(&id, now)? {
            report.removed += 1;
        }
    }

    debug!(
        scanned = report.scanned,
        removed = report.removed,
        corrupt = report.corrupt,
        "Sweep finished"
    );
    Ok(report)
}
