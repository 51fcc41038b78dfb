//! Recording input synthesizer and pacer for tests.
//!
//! Both record into one shared [`Timeline`] when built with
//! [`RecordingPacer::with_timeline`], so a test can assert the exact
//! interleaving of batches and pauses a strategy produces.  Pauses are
//! recorded, never slept.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::application::inject_text::{InjectionError, InputSynthesizer, Pacer, SyntheticInput};

/// One observed step of an injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    Batch(Vec<SyntheticInput>),
    Pause(Duration),
}

/// Shared, ordered record of batches and pauses.
pub type Timeline = Arc<Mutex<Vec<TimelineEntry>>>;

/// An [`InputSynthesizer`] that records every batch instead of calling the OS.
#[derive(Default)]
pub struct MockInputSynthesizer {
    timeline: Timeline,
    /// When `true`, every submission returns [`InjectionError::Platform`].
    pub should_fail: bool,
}

impl MockInputSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { should_fail: true, ..Self::default() }
    }

    /// Handle to the timeline, for sharing with a [`RecordingPacer`].
    pub fn timeline(&self) -> Timeline {
        Arc::clone(&self.timeline)
    }

    pub fn timeline_entries(&self) -> Vec<TimelineEntry> {
        self.timeline.lock().clone()
    }

    /// Submitted batches in order, without pauses.
    pub fn batches(&self) -> Vec<Vec<SyntheticInput>> {
        self.timeline
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                TimelineEntry::Batch(batch) => Some(batch.clone()),
                TimelineEntry::Pause(_) => None,
            })
            .collect()
    }
}

impl InputSynthesizer for MockInputSynthesizer {
    fn submit(&self, batch: &[SyntheticInput]) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        self.timeline.lock().push(TimelineEntry::Batch(batch.to_vec()));
        Ok(())
    }
}

/// A [`Pacer`] that records requested pauses and returns immediately.
#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
    timeline: Option<Timeline>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also appends each pause to `timeline`.
    pub fn with_timeline(timeline: Timeline) -> Self {
        Self { pauses: Mutex::new(Vec::new()), timeline: Some(timeline) }
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().push(duration);
        if let Some(timeline) = &self.timeline {
            timeline.lock().push(TimelineEntry::Pause(duration));
        }
    }
}
