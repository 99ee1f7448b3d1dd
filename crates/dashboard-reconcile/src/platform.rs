//! Platform classification.

use std::sync::Arc;

use dashboard_types::PlatformVariant;
use tracing::{debug, instrument};

use crate::cluster::PlatformDetector;
use crate::error::{DetectionError, StepError};

/// Maps the detected platform identity onto a [`PlatformVariant`].
///
/// Queries the detector once per call and holds no state between passes.
pub struct PlatformClassifier {
    detector: Arc<dyn PlatformDetector>,
}

impl PlatformClassifier {
    pub fn new(detector: Arc<dyn PlatformDetector>) -> Self {
        Self { detector }
    }

    #[instrument(skip(self))]
    pub async fn classify(&self) -> Result<PlatformVariant, StepError> {
        let identity = self
            .detector
            .detect_platform()
            .await
            .map_err(DetectionError::Probe)?;

        let variant = identity
            .parse::<PlatformVariant>()
            .map_err(DetectionError::from)?;

        debug!(identity = %identity, platform = %variant, "Platform classified");
        Ok(variant)
    }
}
