use std::cmp::Ordering;

use crate::foundation::math::{ceil_div_u128, gcd_u64, gcd_u128};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value, reduced to lowest terms.
    ///
    /// Returns `None` when either part is zero.
    pub fn new(num: u32, den: u32) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }
        let g = gcd_u64(u64::from(num), u64::from(den)) as u32;
        Some(Self {
            num: num / g,
            den: den / g,
        })
    }

    /// Whole-number frame rate.
    pub fn integer(fps: u32) -> Option<Self> {
        Self::new(fps, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration(self) -> Seconds {
        Seconds::from_frames(1, self)
    }

    /// Index of the frame displayed at output frame `frame` of a stream running at `timeline`.
    ///
    /// Computes `floor(frame / timeline * self)` without intermediate rounding.
    pub fn frame_at(self, frame: u64, timeline: Fps) -> u64 {
        let num = u128::from(frame) * u128::from(timeline.den) * u128::from(self.num);
        let den = u128::from(timeline.num) * u128::from(self.den);
        u64::try_from(num / den).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Non-negative rational number of seconds.
///
/// Always stored in lowest terms so the derived equality is value equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Seconds {
    num: u64,
    den: u64,
}

impl Seconds {
    /// Zero seconds.
    pub const ZERO: Self = Self { num: 0, den: 1 };

    /// Build `num/den` seconds. Returns `None` for a zero denominator.
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        Some(Self::reduced(u128::from(num), u128::from(den)))
    }

    /// Whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self { num: secs, den: 1 }
    }

    /// Milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::reduced(u128::from(ms), 1000)
    }

    /// Convert floating seconds, rounded to the nearest millisecond.
    ///
    /// Returns `None` for NaN, infinities and negative values.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let ms = (secs * 1000.0).round();
        if ms > u64::MAX as f64 {
            return None;
        }
        Some(Self::from_millis(ms as u64))
    }

    /// Duration of `frames` frames at `fps`.
    pub fn from_frames(frames: u64, fps: Fps) -> Self {
        Self::reduced(
            u128::from(frames) * u128::from(fps.den),
            u128::from(fps.num),
        )
    }

    /// Numerator in lowest terms.
    pub fn numer(self) -> u64 {
        self.num
    }

    /// Denominator in lowest terms.
    pub fn denom(self) -> u64 {
        self.den
    }

    /// Return `true` for a zero duration.
    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Lossy floating-point view.
    pub fn as_secs_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// `ceil(self * fps)`: number of frames needed to cover this duration.
    pub fn frames_ceil(self, fps: Fps) -> u64 {
        let num = u128::from(self.num) * u128::from(fps.num);
        let den = u128::from(self.den) * u128::from(fps.den);
        u64::try_from(ceil_div_u128(num, den)).unwrap_or(u64::MAX)
    }

    fn reduced(num: u128, den: u128) -> Self {
        let g = gcd_u128(num, den).max(1);
        let num = num / g;
        let den = den / g;
        // Durations beyond u64 range are not representable media; saturate instead of panicking.
        match (u64::try_from(num), u64::try_from(den)) {
            (Ok(num), Ok(den)) => Self { num, den },
            _ => Self {
                num: u64::MAX,
                den: 1,
            },
        }
    }
}

impl PartialOrd for Seconds {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Seconds {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.num) * u128::from(other.den);
        let rhs = u128::from(other.num) * u128::from(self.den);
        lhs.cmp(&rhs)
    }
}

impl std::fmt::Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

/// Pixel dimensions of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Build a dimension pair.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length of a tightly packed RGBA8 buffer with these dimensions.
    pub fn rgba8_len(self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
    }

    /// Return `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
