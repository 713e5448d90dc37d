use crate::composite::anchor::SpatialAnchor;
use crate::composite::scale::OverlayScale;
use crate::encode::EncodeOpts;
use crate::foundation::core::Seconds;
use crate::foundation::error::{PipelineError, PipelineResult};

/// Engine-wide defaults. Per-request parameters override `max_duration_secs` and `anchor`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on the output duration for time-varying bases.
    pub max_duration_secs: f64,
    /// Default overlay placement.
    pub anchor: SpatialAnchor,
    /// Overlay resize applied before compositing.
    pub overlay_scale: OverlayScale,
    /// Straight-alpha color transparent output is flattened onto for video.
    pub background_rgba: [u8; 4],
    /// Blend distinct frames in parallel.
    pub parallel_composite: bool,
    /// libx264 constant rate factor.
    pub video_crf: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 10.0,
            anchor: SpatialAnchor::default(),
            overlay_scale: OverlayScale::default(),
            background_rgba: [0, 0, 0, 255],
            parallel_composite: true,
            video_crf: 23,
        }
    }
}

impl EngineConfig {
    /// Parse JSON and validate. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> PipelineResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PipelineError::config(format!("config json parse failed: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.max_duration_secs.is_finite() || self.max_duration_secs <= 0.0 {
            return Err(PipelineError::config(format!(
                "max_duration_secs must be finite and > 0, got {}",
                self.max_duration_secs
            )));
        }
        if self.max_duration().is_zero() {
            return Err(PipelineError::config(format!(
                "max_duration_secs must be at least 1ms, got {}",
                self.max_duration_secs
            )));
        }
        self.overlay_scale.validate().map_err(PipelineError::config)?;
        if self.video_crf > 51 {
            return Err(PipelineError::config(format!(
                "video_crf must be in 0..=51, got {}",
                self.video_crf
            )));
        }
        Ok(())
    }

    /// `max_duration_secs` as exact seconds (millisecond precision).
    pub fn max_duration(&self) -> Seconds {
        Seconds::from_secs_f64(self.max_duration_secs).unwrap_or(Seconds::ZERO)
    }

    pub(crate) fn encode_opts(&self) -> EncodeOpts {
        EncodeOpts {
            background_rgba: self.background_rgba,
            video_crf: self.video_crf,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
