use crate::foundation::core::Dimensions;

/// Where the overlay sits on the base frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpatialAnchor {
    /// Overlay's top-left corner on the base's top-left corner.
    TopLeft,
    /// Overlay's top-right corner on the base's top-right corner.
    TopRight,
    /// Overlay's bottom-left corner on the base's bottom-left corner.
    #[default]
    BottomLeft,
    /// Overlay's bottom-right corner on the base's bottom-right corner.
    BottomRight,
    /// Overlay centered on the base.
    Center,
    /// Overlay's top-left corner at an explicit pixel offset.
    Custom {
        /// Horizontal offset in pixels.
        x: u32,
        /// Vertical offset in pixels.
        y: u32,
    },
}

/// Overlay rectangle resolved against a concrete base frame.
///
/// `width`/`height` are the visible extent after clipping to the base, so they can be smaller than
/// the overlay itself (or zero when nothing is visible).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Left edge in base pixels.
    pub x: u32,
    /// Top edge in base pixels.
    pub y: u32,
    /// Visible width.
    pub width: u32,
    /// Visible height.
    pub height: u32,
}

impl Placement {
    /// Return `true` when `(x, y)` (base coordinates) is covered by the overlay.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x
            && y >= self.y
            && u64::from(x) < u64::from(self.x) + u64::from(self.width)
            && u64::from(y) < u64::from(self.y) + u64::from(self.height)
    }
}

impl SpatialAnchor {
    /// Resolve to the overlay's top-left offset on a `base`-sized frame.
    ///
    /// Offsets are clamped so an overlay that fits stays fully inside the base. An overlay larger
    /// than the base on some axis is pinned to 0 on that axis and clipped at the far edge.
    pub fn resolve(self, base: Dimensions, overlay: Dimensions) -> Placement {
        let bw = i64::from(base.width);
        let bh = i64::from(base.height);
        let ow = i64::from(overlay.width);
        let oh = i64::from(overlay.height);

        let (x, y) = match self {
            Self::TopLeft => (0, 0),
            Self::TopRight => (bw - ow, 0),
            Self::BottomLeft => (0, bh - oh),
            Self::BottomRight => (bw - ow, bh - oh),
            Self::Center => ((bw - ow) / 2, (bh - oh) / 2),
            Self::Custom { x, y } => (i64::from(x), i64::from(y)),
        };

        let x = clamp_axis(x, bw, ow);
        let y = clamp_axis(y, bh, oh);
        Placement {
            x: x as u32,
            y: y as u32,
            width: ow.min(bw - x) as u32,
            height: oh.min(bh - y) as u32,
        }
    }
}

fn clamp_axis(pos: i64, base: i64, overlay: i64) -> i64 {
    if overlay >= base {
        0
    } else {
        pos.clamp(0, base - overlay)
    }
}

impl std::str::FromStr for SpatialAnchor {
    type Err = String;

    /// Accepts `top-left`, `top-right`, `bottom-left`, `bottom-right`, `center`, their two-letter
    /// short forms, or an explicit `x,y` offset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "top-left" | "tl" => return Ok(Self::TopLeft),
            "top-right" | "tr" => return Ok(Self::TopRight),
            "bottom-left" | "bl" => return Ok(Self::BottomLeft),
            "bottom-right" | "br" => return Ok(Self::BottomRight),
            "center" | "centre" | "c" => return Ok(Self::Center),
            _ => {}
        }
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("unknown anchor '{s}'"))?;
        let x = x
            .trim()
            .parse()
            .map_err(|e| format!("invalid anchor x '{x}': {e}"))?;
        let y = y
            .trim()
            .parse()
            .map_err(|e| format!("invalid anchor y '{y}': {e}"))?;
        Ok(Self::Custom { x, y })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/anchor.rs"]
mod tests;
