//! Deferred detector construction.

use std::sync::OnceLock;

use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::ports::{NullDetector, ObjectDetector};

/// Builds a detector on first use.
pub type DetectorLoader =
    Box<dyn Fn() -> anyhow::Result<Box<dyn ObjectDetector>> + Send + Sync>;

/// A detector that is loaded at most once.
///
/// The first call to [`LazyDetector::get`] runs the loader. Both a loaded
/// detector and a load failure are cached, so a broken model is reported on
/// every later call without retrying.
pub struct LazyDetector {
    loader: Option<DetectorLoader>,
    detector: OnceLock<Result<Box<dyn ObjectDetector>, String>>,
}

impl LazyDetector {
    /// Creates a detector that runs `loader` on first use.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn ObjectDetector>> + Send + Sync + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            detector: OnceLock::new(),
        }
    }

    /// Wraps an already constructed detector.
    pub fn ready(detector: impl ObjectDetector + 'static) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Box::new(detector) as Box<dyn ObjectDetector>));
        Self {
            loader: None,
            detector: cell,
        }
    }

    /// A detector that never finds anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::ready(NullDetector)
    }

    /// Returns the detector, loading it if this is the first call.
    ///
    /// # Errors
    ///
    /// Returns `DetectorUnavailable` if loading failed now or on an earlier call.
    pub fn get(&self) -> Result<&dyn ObjectDetector, AnalysisError> {
        let slot = self.detector.get_or_init(|| {
            let Some(loader) = &self.loader else {
                return Err("no detector loader configured".to_string());
            };
            match loader() {
                Ok(detector) => {
                    info!("Loaded {} detector", detector.name());
                    Ok(detector)
                }
                Err(e) => {
                    warn!("Failed to load detector: {e:#}");
                    Err(format!("{e:#}"))
                }
            }
        });

        slot.as_deref()
            .map_err(|e| AnalysisError::DetectorUnavailable(e.clone()))
    }

    /// Returns true once a load has been attempted (successfully or not).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.detector.get().is_some()
    }
}

impl Default for LazyDetector {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for LazyDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.detector.get() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("LazyDetector").field("state", &state).finish()
    }
}
