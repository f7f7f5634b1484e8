//! Aspect ratios, frame sizes and reframe geometry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Short side of the default render frame, in pixels.
pub const DEFAULT_SHORT_SIDE: u32 = 1080;

/// Target aspect ratio as width:height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Standard portrait (9:16) for TikTok/Reels
    pub const PORTRAIT: AspectRatio = AspectRatio {
        width: 9,
        height: 16,
    };

    /// Landscape (16:9)
    pub const LANDSCAPE: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };

    /// Square (1:1)
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    /// Instagram portrait (4:5)
    pub const INSTAGRAM_PORTRAIT: AspectRatio = AspectRatio {
        width: 4,
        height: 5,
    };

    /// Create a new aspect ratio.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the aspect ratio as a decimal.
    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidAspectRatio(format!("{}, expected 'W:H'", s)))?;

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidAspectRatio(format!("bad width in {}", s)))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidAspectRatio(format!("bad height in {}", s)))?;

        if width == 0 || height == 0 {
            return Err(ModelError::InvalidAspectRatio(format!(
                "{} has a zero component",
                s
            )));
        }

        Ok(AspectRatio { width, height })
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Source size assumed when probing fails.
    pub const FALLBACK_SOURCE: FrameSize = FrameSize {
        width: 1920,
        height: 1080,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Frame for `aspect` whose shorter side is `short_side` pixels.
    ///
    /// The longer side is rounded to an even pixel count.
    pub fn for_aspect(aspect: AspectRatio, short_side: u32) -> Self {
        let short = short_side as f64;
        if aspect.width >= aspect.height {
            let long = round_even(short * aspect.as_f64());
            Self::new(long, short_side)
        } else {
            let long = round_even(short / aspect.as_f64());
            Self::new(short_side, long)
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Round to the nearest even integer (ties go up).
pub fn round_even(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    ((value / 2.0).round() as u32) * 2
}

/// Strategy for mapping a source frame into the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReframePolicy {
    /// Fill the target frame and discard edge content
    #[default]
    Crop,
    /// Keep all content and pad the remaining axis
    Fit,
}

impl fmt::Display for ReframePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReframePolicy::Crop => write!(f, "crop"),
            ReframePolicy::Fit => write!(f, "fit"),
        }
    }
}

impl FromStr for ReframePolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crop" => Ok(ReframePolicy::Crop),
            "fit" | "pad" | "letterbox" => Ok(ReframePolicy::Fit),
            other => Err(ModelError::invalid_config(format!(
                "unknown reframe policy '{}'",
                other
            ))),
        }
    }
}

/// Scale/crop/pad parameters for one source/target pair.
///
/// The source is scaled to `scale_width x scale_height`, then either
/// cropped at `(crop_x, crop_y)` (crop policy) or padded by `pad_x`/`pad_y`
/// on each side (fit policy) to reach `target_width x target_height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReframeGeometry {
    pub scale_width: u32,
    pub scale_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub crop_x: u32,
    pub crop_y: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub policy: ReframePolicy,
}

impl ReframeGeometry {
    pub fn target(&self) -> FrameSize {
        FrameSize::new(self.target_width, self.target_height)
    }

    /// True when the scaled frame is larger than the target on some axis.
    pub fn crops(&self) -> bool {
        self.scale_width > self.target_width || self.scale_height > self.target_height
    }

    /// True when padding is added on some axis.
    pub fn pads(&self) -> bool {
        self.pad_x > 0 || self.pad_y > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_parse() {
        let ratio: AspectRatio = "9:16".parse().unwrap();
        assert_eq!(ratio, AspectRatio::PORTRAIT);
        assert!((ratio.as_f64() - 0.5625).abs() < 1e-9);
        assert!("9x16".parse::<AspectRatio>().is_err());
        assert!("0:16".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_frame_for_aspect() {
        assert_eq!(
            FrameSize::for_aspect(AspectRatio::PORTRAIT, 1080),
            FrameSize::new(1080, 1920)
        );
        assert_eq!(
            FrameSize::for_aspect(AspectRatio::LANDSCAPE, 1080),
            FrameSize::new(1920, 1080)
        );
        assert_eq!(
            FrameSize::for_aspect(AspectRatio::INSTAGRAM_PORTRAIT, 1080),
            FrameSize::new(1080, 1350)
        );
        assert_eq!(
            FrameSize::for_aspect(AspectRatio::SQUARE, 1080),
            FrameSize::new(1080, 1080)
        );
    }

    #[test]
    fn test_round_even() {
        assert_eq!(round_even(607.5), 608);
        assert_eq!(round_even(606.9), 606);
        assert_eq!(round_even(1080.0), 1080);
        assert_eq!(round_even(-3.0), 0);
    }
}
