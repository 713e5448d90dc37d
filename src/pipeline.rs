use std::sync::Arc;

use crate::composite::anchor::SpatialAnchor;
use crate::composite::compositor::{CompositeOpts, CompositeStats, composite_with_stats};
use crate::composite::scale::{OverlayScale, scale_sequence};
use crate::config::EngineConfig;
use crate::encode::artifact::{ContainerKind, OutputArtifact};
use crate::encode::encode;
use crate::foundation::core::Seconds;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::media::decode::{decode, decode_with_limit};
use crate::media::source::{MediaKind, MediaSource, Sequence};
use crate::timeline::speed::{self, SpeedFactor};
use crate::timeline::window::{CompositeWindow, normalize};

/// Per-call knobs. `None` falls back to the engine's [`EngineConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayParams {
    /// Overlay playback speed; must lie in `[0.1, 3.0]`.
    pub speed: f64,
    /// Overlay placement.
    pub anchor: Option<SpatialAnchor>,
    /// Output duration cap for time-varying bases, in seconds.
    pub max_duration_secs: Option<f64>,
    /// Overlay resize.
    pub scale: Option<OverlayScale>,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            anchor: None,
            max_duration_secs: None,
            scale: None,
        }
    }
}

/// One base payload to composite the overlay onto.
#[derive(Clone, Copy, Debug)]
pub struct OverlayRequest<'a> {
    /// Encoded base media.
    pub bytes: &'a [u8],
    /// Declared kind of `bytes`.
    pub kind: MediaKind,
    /// Per-call parameters.
    pub params: OverlayParams,
}

impl<'a> OverlayRequest<'a> {
    /// Request with default parameters (speed 1.0, engine anchor/cap/scale).
    pub fn new(bytes: &'a [u8], kind: MediaKind) -> Self {
        Self {
            bytes,
            kind,
            params: OverlayParams::default(),
        }
    }

    /// Set the overlay speed factor.
    pub fn speed(mut self, speed: f64) -> Self {
        self.params.speed = speed;
        self
    }

    /// Override the anchor.
    pub fn anchor(mut self, anchor: SpatialAnchor) -> Self {
        self.params.anchor = Some(anchor);
        self
    }

    /// Override the output duration cap.
    pub fn max_duration_secs(mut self, secs: f64) -> Self {
        self.params.max_duration_secs = Some(secs);
        self
    }

    /// Override the overlay scale.
    pub fn scale(mut self, scale: OverlayScale) -> Self {
        self.params.scale = Some(scale);
        self
    }
}

/// Composited frames before encoding.
#[derive(Clone, Debug)]
pub struct Rendered {
    /// Output timeline.
    pub window: CompositeWindow,
    /// One frame per window slot, at `window.fps`.
    pub frames: Sequence,
    /// Container the frames should be encoded into.
    pub target: ContainerKind,
    /// Blend/reuse counters.
    pub stats: CompositeStats,
}

#[derive(Clone, Copy, Debug)]
struct ResolvedParams {
    speed: SpeedFactor,
    anchor: SpatialAnchor,
    max_duration: Seconds,
    scale: OverlayScale,
}

/// Composites one fixed overlay onto arbitrary base media.
///
/// Built once from the overlay asset; [`OverlayEngine::run`] is safe to call from many threads at
/// once since the overlay is shared read-only.
#[derive(Clone, Debug)]
pub struct OverlayEngine {
    overlay: Arc<Sequence>,
    config: EngineConfig,
}

impl OverlayEngine {
    /// Build from an already decoded overlay, which must be time-varying.
    pub fn new(overlay: MediaSource, config: EngineConfig) -> PipelineResult<Self> {
        config.validate()?;
        match overlay {
            MediaSource::Sequence(seq) => {
                tracing::debug!(
                    frames = seq.len(),
                    fps = %seq.fps(),
                    dims = %seq.dimensions(),
                    "overlay loaded"
                );
                Ok(Self {
                    overlay: Arc::new(seq),
                    config,
                })
            }
            MediaSource::Still(_) => Err(PipelineError::invalid_overlay(
                "overlay must be an animated image or video, got a still image",
            )),
        }
    }

    /// Decode the overlay asset and build the engine.
    pub fn from_overlay_bytes(
        bytes: &[u8],
        kind: MediaKind,
        config: EngineConfig,
    ) -> PipelineResult<Self> {
        let overlay = decode(bytes, kind)
            .map_err(|e| PipelineError::invalid_overlay(format!("overlay failed to decode: {e}")))?;
        Self::new(overlay, config)
    }

    /// The decoded overlay, at its native size and speed.
    pub fn overlay(&self) -> &Sequence {
        &self.overlay
    }

    /// Engine defaults.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decode `req.bytes`, composite the overlay onto it and encode the result.
    ///
    /// The speed is validated before anything is decoded. Any failure aborts the whole request.
    #[tracing::instrument(
        skip_all,
        fields(kind = req.kind.as_str(), bytes = req.bytes.len(), speed = req.params.speed)
    )]
    pub fn run(&self, req: &OverlayRequest<'_>) -> PipelineResult<OutputArtifact> {
        let params = self.resolve(&req.params)?;
        let base = decode_with_limit(req.bytes, req.kind, Some(params.max_duration))?;
        tracing::debug!(
            frames = base.frame_count(),
            dims = %base.dimensions(),
            duration = %base.duration(),
            "decoded base"
        );

        let rendered = self.render_resolved(&base, &params);
        let artifact = encode(
            rendered.frames.frames(),
            &rendered.window,
            rendered.target,
            &self.config.encode_opts(),
        )?;
        Ok(artifact)
    }

    /// Composite onto an already decoded base without encoding.
    #[tracing::instrument(skip_all, fields(speed = params.speed))]
    pub fn render(&self, base: &MediaSource, params: &OverlayParams) -> PipelineResult<Rendered> {
        let params = self.resolve(params)?;
        Ok(self.render_resolved(base, &params))
    }

    fn resolve(&self, params: &OverlayParams) -> PipelineResult<ResolvedParams> {
        let speed = SpeedFactor::new(params.speed)?;

        let max_duration = match params.max_duration_secs {
            Some(secs) => {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(PipelineError::invalid_request(format!(
                        "max duration must be finite and > 0, got {secs}"
                    )));
                }
                Seconds::from_secs_f64(secs)
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| {
                        PipelineError::invalid_request(format!(
                            "max duration must be at least 1ms, got {secs}"
                        ))
                    })?
            }
            None => self.config.max_duration(),
        };

        let scale = params.scale.unwrap_or(self.config.overlay_scale);
        scale.validate().map_err(PipelineError::invalid_request)?;

        Ok(ResolvedParams {
            speed,
            anchor: params.anchor.unwrap_or(self.config.anchor),
            max_duration,
            scale,
        })
    }

    fn render_resolved(&self, base: &MediaSource, params: &ResolvedParams) -> Rendered {
        let target_dims = params
            .scale
            .target(self.overlay.dimensions(), base.dimensions());
        let scaled = scale_sequence(&self.overlay, target_dims);
        let overlay = speed::apply(&scaled, params.speed);

        let window = normalize(base, &overlay, params.max_duration);
        tracing::debug!(
            duration = %window.duration,
            fps = %window.fps,
            frames = window.frame_count,
            overlay_frames = overlay.len(),
            overlay_dims = %overlay.dimensions(),
            "normalized window"
        );

        let opts = CompositeOpts {
            parallel: self.config.parallel_composite,
        };
        let (frames, stats) = composite_with_stats(base, &overlay, &window, params.anchor, &opts);
        let target = ContainerKind::select(base.is_sequence(), window.frame_count);
        tracing::debug!(
            blended = stats.frames_blended,
            reused = stats.frames_reused,
            target = ?target,
            "composited"
        );

        Rendered {
            window,
            frames,
            target,
            stats,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
