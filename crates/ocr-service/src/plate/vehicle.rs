//! Vehicle region detection from localized object annotations.

use super::config::PlateEngineConfig;
use super::geometry::box_from_normalized;
use common::plates::{ImageDescriptor, PixelBox, RawObjectAnnotation};

/// Largest vehicle box among the object annotations.
///
/// `None` when the image has no area, no annotation carries a vehicle label,
/// or every vehicle box is degenerate. Ties keep the first annotation.
pub fn detect_vehicle_box(
    objects: &[RawObjectAnnotation],
    image: ImageDescriptor,
    config: &PlateEngineConfig,
) -> Option<PixelBox> {
    if objects.is_empty() || image.is_empty() {
        return None;
    }

    let mut best: Option<PixelBox> = None;
    let mut best_area = 0;

    for object in objects {
        if !config.is_vehicle_label(&object.label) {
            continue;
        }

        let Some(candidate) = box_from_normalized(&object.normalized_vertices, image) else {
            tracing::trace!(label = %object.label, "vehicle annotation without usable vertices");
            continue;
        };

        let area = candidate.area();
        if area > best_area {
            best_area = area;
            best = Some(candidate);
        }
    }

    best
}
