use std::sync::Arc;

use parking_lot::RwLock;
use re_chunk::{EntityPath, TimePoint, WireBatch};

/// Everything sent for one entity at one point in time, in sending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRow {
    pub entity_path: EntityPath,

    /// Empty for static data.
    pub timepoint: TimePoint,

    pub batches: Vec<WireBatch>,
}

/// Where the SDK sends its encoded component batches.
///
/// This is the single ingestion entry point of whatever stores the data: submissions are
/// fire-and-forget, durability is the sink's business.
pub trait LogSink: Send + Sync + 'static {
    /// Submits the batches of one row.
    ///
    /// An empty `timepoint` means the data is static.
    fn submit(&self, entity_path: &EntityPath, timepoint: &TimePoint, batches: Vec<WireBatch>);

    /// Submits many rows of the same entity, in order.
    #[inline]
    fn submit_rows(&self, entity_path: &EntityPath, rows: Vec<(TimePoint, Vec<WireBatch>)>) {
        for (timepoint, batches) in rows {
            self.submit(entity_path, &timepoint, batches);
        }
    }
}

// ----------------------------------------------------------------------------

/// Stores submitted rows directly in memory, for inspection.
#[derive(Default)]
pub struct MemorySink(MemorySinkStorage);

impl MemorySink {
    /// Access the raw `MemorySinkStorage`
    #[inline]
    pub fn buffer(&self) -> MemorySinkStorage {
        self.0.clone()
    }
}

impl LogSink for MemorySink {
    #[inline]
    fn submit(&self, entity_path: &EntityPath, timepoint: &TimePoint, batches: Vec<WireBatch>) {
        self.0.write().push(SubmittedRow {
            entity_path: entity_path.clone(),
            timepoint: timepoint.clone(),
            batches,
        });
    }

    #[inline]
    fn submit_rows(&self, entity_path: &EntityPath, rows: Vec<(TimePoint, Vec<WireBatch>)>) {
        self.0
            .write()
            .extend(rows.into_iter().map(|(timepoint, batches)| SubmittedRow {
                entity_path: entity_path.clone(),
                timepoint,
                batches,
            }));
    }
}

/// The storage used by [`MemorySink`].
#[derive(Default, Clone)]
pub struct MemorySinkStorage(Arc<RwLock<Vec<SubmittedRow>>>);

impl MemorySinkStorage {
    /// Write access to the inner array of [`SubmittedRow`].
    #[inline]
    fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Vec<SubmittedRow>> {
        self.0.write()
    }

    /// Read access to the inner array of [`SubmittedRow`].
    #[inline]
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Vec<SubmittedRow>> {
        self.0.read()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.0.read().len()
    }

    /// Consumes and returns the inner array of [`SubmittedRow`].
    #[inline]
    pub fn take(&self) -> Vec<SubmittedRow> {
        std::mem::take(&mut *self.0.write())
    }
}

impl std::fmt::Debug for MemorySinkStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySinkStorage")
            .field("num_rows", &self.num_rows())
            .finish_non_exhaustive()
    }
}
