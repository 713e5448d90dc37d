//! Overlaid composites one fixed animated overlay onto arbitrary user media.
//!
//! The engine is built once from the overlay asset and then applied per request:
//!
//! - Decode the base payload (still image, animated image or video) into a [`MediaSource`]
//! - Retime the overlay by a [`SpeedFactor`] and reconcile both onto one [`CompositeWindow`]
//! - Blend the overlay onto every output frame at a [`SpatialAnchor`]
//! - Encode the result as MP4 for time-varying bases, or as a looping GIF/PNG otherwise
//!
//! Video decode and encode shell out to the system `ffmpeg`/`ffprobe` (feature `media-ffmpeg`).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod composite;
mod config;
mod encode;
#[cfg(feature = "media-ffmpeg")]
mod ffmpeg;
mod foundation;
mod media;
mod pipeline;
mod timeline;

pub use crate::composite::anchor::{Placement, SpatialAnchor};
pub use crate::composite::compositor::{
    CompositeOpts, CompositeStats, composite, composite_with_stats,
};
pub use crate::composite::scale::{OverlayScale, scale_sequence};
pub use crate::config::EngineConfig;
pub use crate::encode::artifact::{ContainerKind, OutputArtifact, OutputFormat};
pub use crate::encode::{EncodeOpts, encode};
pub use crate::foundation::core::{Dimensions, Fps, Seconds};
pub use crate::foundation::error::{DecodeError, EncodeError, PipelineError, PipelineResult};
pub use crate::media::decode::{decode, decode_with_limit};
pub use crate::media::source::{MediaKind, MediaSource, RgbaFrame, Sequence};
pub use crate::media::video::{VideoProbe, probe_video};
pub use crate::pipeline::{OverlayEngine, OverlayParams, OverlayRequest, Rendered};
pub use crate::timeline::speed::{SpeedFactor, apply as apply_speed};
pub use crate::timeline::window::{CompositeWindow, normalize};

#[cfg(feature = "media-ffmpeg")]
pub use crate::ffmpeg::{is_ffmpeg_on_path, is_ffprobe_on_path};
