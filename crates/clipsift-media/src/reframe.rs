//! Reframe geometry calculator.
//!
//! Maps a source frame into a target frame under one of two policies:
//!
//! - **Crop**: scale so the source covers the target on both axes, then
//!   center-crop the overflow.
//! - **Fit**: scale by the binding axis so the whole source fits, then pad
//!   the other axis symmetrically.
//!
//! All scaled dimensions are even. Targets are forced even before any
//! arithmetic, so `2 * pad + scaled == target` holds exactly.

use clipsift_models::geometry::{round_even, DEFAULT_SHORT_SIDE};
use clipsift_models::{AspectRatio, FrameSize, ReframeGeometry, ReframePolicy};

/// Round down to an even pixel count.
pub fn make_even(value: u32) -> u32 {
    (value / 2) * 2
}

/// Geometry for a source size and a target aspect ratio.
///
/// The target frame has a 1080 px short side. A source with a zero
/// dimension is replaced by the 1920x1080 fallback.
pub fn compute_reframe(
    source_width: u32,
    source_height: u32,
    target_aspect: AspectRatio,
    policy: ReframePolicy,
) -> ReframeGeometry {
    let target = FrameSize::for_aspect(target_aspect, DEFAULT_SHORT_SIDE);
    compute_geometry(FrameSize::new(source_width, source_height), target, policy)
}

/// Geometry for explicit source and target frame sizes.
pub fn compute_geometry(
    source: FrameSize,
    target: FrameSize,
    policy: ReframePolicy,
) -> ReframeGeometry {
    let source = if source.is_valid() {
        source
    } else {
        FrameSize::FALLBACK_SOURCE
    };
    let target = FrameSize::new(make_even(target.width).max(2), make_even(target.height).max(2));

    let (sw, sh) = (source.width as f64, source.height as f64);
    let (tw, th) = (target.width, target.height);

    match policy {
        ReframePolicy::Fit => {
            let (scale_width, scale_height) = if source.aspect() > target.aspect() {
                // Width binds: full target width, pad vertically.
                let h = round_even(sh * tw as f64 / sw).clamp(2, th);
                (tw, h)
            } else {
                let w = round_even(sw * th as f64 / sh).clamp(2, tw);
                (w, th)
            };

            ReframeGeometry {
                scale_width,
                scale_height,
                pad_x: (tw - scale_width) / 2,
                pad_y: (th - scale_height) / 2,
                crop_x: 0,
                crop_y: 0,
                target_width: tw,
                target_height: th,
                policy,
            }
        }
        ReframePolicy::Crop => {
            let factor = (tw as f64 / sw).max(th as f64 / sh);
            let scale_width = round_even(sw * factor).max(tw);
            let scale_height = round_even(sh * factor).max(th);

            ReframeGeometry {
                scale_width,
                scale_height,
                pad_x: 0,
                pad_y: 0,
                crop_x: (scale_width - tw) / 2,
                crop_y: (scale_height - th) / 2,
                target_width: tw,
                target_height: th,
                policy,
            }
        }
    }
}
