//! Conversion of provider polygons into pixel boxes.

use common::plates::{ImageDescriptor, NormalizedVertex, PixelBox, Vertex};

/// Largest coordinate magnitude accepted from a provider. A polygon with a
/// vertex beyond it is malformed and yields no box.
pub const MAX_COORDINATE: i64 = 1 << 31;

/// Bounding box of absolute pixel vertices.
///
/// Vertices missing a coordinate are ignored; `None` when no complete vertex
/// remains or when any vertex lies outside [`MAX_COORDINATE`].
pub fn box_from_vertices(vertices: &[Vertex]) -> Option<PixelBox> {
    let points = vertices.iter().filter_map(|v| Some((v.x?, v.y?)));
    bounding_box(points)
}

/// Bounding box of normalized vertices scaled to the image size.
///
/// Scaled coordinates are floored. Non-finite coordinates are ignored, and
/// a vertex scaling past [`MAX_COORDINATE`] rejects the whole polygon.
pub fn box_from_normalized(
    vertices: &[NormalizedVertex],
    image: ImageDescriptor,
) -> Option<PixelBox> {
    let (w, h) = (image.width as f64, image.height as f64);
    let points = vertices.iter().filter_map(|v| {
        let (fx, fy) = (v.x?, v.y?);
        if !fx.is_finite() || !fy.is_finite() {
            return None;
        }
        // `as` saturates, so huge values stay out of range
        Some(((fx * w).floor() as i64, (fy * h).floor() as i64))
    });
    bounding_box(points)
}

fn in_range(v: i64) -> bool {
    (-MAX_COORDINATE..=MAX_COORDINATE).contains(&v)
}

fn bounding_box(points: impl Iterator<Item = (i64, i64)>) -> Option<PixelBox> {
    let mut acc: Option<PixelBox> = None;
    for (x, y) in points {
        if !in_range(x) || !in_range(y) {
            return None;
        }
        acc = Some(match acc {
            None => PixelBox {
                x1: x,
                y1: y,
                x2: x,
                y2: y,
            },
            Some(b) => PixelBox {
                x1: b.x1.min(x),
                y1: b.y1.min(y),
                x2: b.x2.max(x),
                y2: b.y2.max(y),
            },
        });
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_rotated_polygon() {
        let vertices = vec![
            Vertex::new(12, 30),
            Vertex::new(40, 26),
            Vertex::new(42, 44),
            Vertex::new(14, 48),
        ];
        assert_eq!(
            box_from_vertices(&vertices),
            Some(PixelBox::new(12, 26, 42, 48))
        );
    }

    #[test]
    fn test_incomplete_vertices_are_ignored() {
        let vertices = vec![
            Vertex { x: Some(5), y: None },
            Vertex::new(10, 10),
            Vertex::new(20, 18),
        ];
        assert_eq!(
            box_from_vertices(&vertices),
            Some(PixelBox::new(10, 10, 20, 18))
        );

        let broken = vec![Vertex { x: None, y: Some(3) }];
        assert_eq!(box_from_vertices(&broken), None);
        assert_eq!(box_from_vertices(&[]), None);
    }

    #[test]
    fn test_normalized_box_is_scaled_and_floored() {
        let image = ImageDescriptor::new(640, 480);
        let vertices = vec![
            NormalizedVertex::new(0.1, 0.25),
            NormalizedVertex::new(0.8999, 0.25),
            NormalizedVertex::new(0.8999, 0.9),
            NormalizedVertex::new(0.1, 0.9),
        ];
        assert_eq!(
            box_from_normalized(&vertices, image),
            Some(PixelBox::new(64, 120, 575, 432))
        );
    }

    #[test]
    fn test_normalized_box_skips_non_finite() {
        let image = ImageDescriptor::new(100, 100);
        let vertices = vec![
            NormalizedVertex::new(f64::NAN, 0.5),
            NormalizedVertex::new(0.2, 0.2),
            NormalizedVertex::new(0.4, 0.6),
        ];
        assert_eq!(
            box_from_normalized(&vertices, image),
            Some(PixelBox::new(20, 20, 40, 60))
        );
    }

    #[test]
    fn test_out_of_range_polygons_are_rejected() {
        let word = vec![
            Vertex::new(-9_000_000_000_000_000_000, 80),
            Vertex::new(9_000_000_000_000_000_000, 90),
        ];
        assert_eq!(box_from_vertices(&word), None);

        let edge = vec![Vertex::new(0, 0), Vertex::new(MAX_COORDINATE, 10)];
        assert_eq!(box_from_vertices(&edge), Some(PixelBox::new(0, 0, MAX_COORDINATE, 10)));

        let image = ImageDescriptor::new(200, 100);
        let object = vec![
            NormalizedVertex::new(-1e30, 0.0),
            NormalizedVertex::new(1e30, 1.0),
        ];
        assert_eq!(box_from_normalized(&object, image), None);
    }
}
