//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use roofscan_core::domain::{BoundingBox, CostRange, Detection};
use roofscan_core::inference::LazyDetector;
use roofscan_core::ports::{
    CostSampler, ObjectDetector, PricingSource, ProgressEvent, ProgressSink,
};
use roofscan_core::pricing::MarketCosts;

fn bump(counter: &Mutex<usize>) {
    *counter.lock().unwrap_or_else(PoisonError::into_inner) += 1;
}

fn read(counter: &Mutex<usize>) -> usize {
    *counter.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock object detector returning canned detections.
///
/// Clones share the call counter, so a test can keep a handle after moving
/// the detector into a session.
#[derive(Clone)]
pub struct MockDetector {
    detections: Vec<Detection>,
    failure: Option<String>,
    calls: Arc<Mutex<usize>>,
}

impl MockDetector {
    /// Creates a detector that returns `detections` for every image.
    #[must_use]
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            failure: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates a detector that never finds anything.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a detector returning `count` non-overlapping boxes.
    #[must_use]
    pub fn with_boxes(count: u32, label: &str, confidence: f32) -> Self {
        let detections = (0..count)
            .map(|i| Detection {
                bbox: BoundingBox::new(i * 20, 0, 16, 16),
                label: label.to_string(),
                confidence,
            })
            .collect();
        Self::new(detections)
    }

    /// Creates a detector whose inference always fails.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::empty()
        }
    }

    /// Returns how many images were passed to `detect`.
    #[must_use]
    pub fn calls(&self) -> usize {
        read(&self.calls)
    }
}

impl ObjectDetector for MockDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn detect(&self, _image: &image::DynamicImage) -> anyhow::Result<Vec<Detection>> {
        bump(&self.calls);
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.detections.clone()),
        }
    }
}

/// Counts how many times a lazy detector ran its loader.
#[derive(Clone, Default)]
pub struct LoadCounter(Arc<Mutex<usize>>);

impl LoadCounter {
    /// Returns the number of loads.
    #[must_use]
    pub fn count(&self) -> usize {
        read(&self.0)
    }
}

/// Wraps `detector` in a lazy loader that counts loads.
#[must_use]
pub fn counting_lazy(detector: MockDetector) -> (LazyDetector, LoadCounter) {
    let counter = LoadCounter::default();
    let loads = counter.clone();
    let lazy = LazyDetector::new(move || {
        bump(&loads.0);
        Ok(Box::new(detector.clone()) as Box<dyn ObjectDetector>)
    });
    (lazy, counter)
}

/// A lazy detector whose loader always fails with `message`.
#[must_use]
pub fn failing_lazy(message: &str) -> (LazyDetector, LoadCounter) {
    let counter = LoadCounter::default();
    let loads = counter.clone();
    let message = message.to_string();
    let lazy = LazyDetector::new(move || {
        bump(&loads.0);
        anyhow::bail!("{message}")
    });
    (lazy, counter)
}

/// Mock pricing source.
#[derive(Clone)]
pub struct MockPricingSource {
    result: Result<MarketCosts, String>,
    fetches: Arc<Mutex<usize>>,
}

impl MockPricingSource {
    /// A source that returns `costs`.
    #[must_use]
    pub fn ok(costs: MarketCosts) -> Self {
        Self {
            result: Ok(costs),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// A source that fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns how many times `fetch` was called.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        read(&self.fetches)
    }
}

impl PricingSource for MockPricingSource {
    fn describe(&self) -> String {
        match &self.result {
            Ok(costs) => format!("mock pricing ({})", costs.source),
            Err(_) => "mock pricing (failing)".to_string(),
        }
    }

    fn fetch(&self) -> anyhow::Result<MarketCosts> {
        bump(&self.fetches);
        self.result.clone().map_err(|message| anyhow::anyhow!(message))
    }
}

/// Which end of the range a [`FixedCostSampler`] picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    /// Always the minimum.
    Min,
    /// Always the maximum.
    Max,
}

/// Deterministic cost sampler that records every range it was asked about.
#[derive(Clone)]
pub struct FixedCostSampler {
    end: RangeEnd,
    seen: Arc<Mutex<Vec<CostRange>>>,
}

impl FixedCostSampler {
    /// Creates a sampler picking `end` of every range.
    #[must_use]
    pub fn new(end: RangeEnd) -> Self {
        Self {
            end,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the ranges sampled so far.
    #[must_use]
    pub fn ranges(&self) -> Vec<CostRange> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CostSampler for FixedCostSampler {
    fn sample(&mut self, range: &CostRange) -> u32 {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*range);
        match self.end {
            RangeEnd::Min => range.min,
            RangeEnd::Max => range.max,
        }
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `(current, total)` of every `Started` event, in order.
    #[must_use]
    pub fn started(&self) -> Vec<(usize, usize)> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Started { current, total, .. } => Some((*current, *total)),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
