//! Plate zone estimation.

use super::config::ZoneRatios;
use common::plates::{ImageDescriptor, PixelBox};

/// Region where a plate is expected: the lower-middle band of the vehicle box,
/// or of the whole frame when no vehicle was found.
///
/// Offsets are truncated to whole pixels. The reference size is clamped to at
/// least one pixel, so a zero-size image yields an empty zone at the origin.
pub fn estimate_plate_zone(
    vehicle: Option<PixelBox>,
    image: ImageDescriptor,
    ratios: &ZoneRatios,
) -> PixelBox {
    let reference = vehicle.unwrap_or_else(|| image.full_box());

    let vw = (reference.x2 - reference.x1).max(1) as f64;
    let vh = (reference.y2 - reference.y1).max(1) as f64;
    let (x0, y0) = (reference.x1 as f64, reference.y1 as f64);

    PixelBox {
        x1: (x0 + vw * ratios.left) as i64,
        y1: (y0 + vh * ratios.top) as i64,
        x2: (x0 + vw * ratios.right) as i64,
        y2: (y0 + vh * ratios.bottom) as i64,
    }
}
