//! Progress reporting port for UI integration.

/// Events emitted during an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Analysis is about to start on a photo.
    Started {
        /// 1-based position of the photo in the batch.
        current: usize,
        /// Batch size. Constant within a run.
        total: usize,
        /// Photo label.
        label: String,
    },
    /// A photo failed and contributed no findings.
    Skipped {
        /// 0-based position of the photo in the batch.
        index: usize,
        /// Photo label.
        label: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All photos have been processed.
    Finished {
        /// Photos analyzed successfully.
        processed: usize,
        /// Photos skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
///
/// Events are delivered synchronously on the thread running the analysis.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Progress sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
