//! Coordinate transformation between page-normalized, surface and PDF space
//!
//! Normalized boxes use a top-left origin in `[0, 1]`. Surfaces (canvas,
//! image element) use top-left pixels. PDF user space uses points with a
//! bottom-left origin inside the page's media box.

use serde::{Deserialize, Serialize};
use shared_types::BoundingBox;

/// Rectangle on a rendered surface, in pixels, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Zero-area boxes come from single-point polygons and are not drawn
pub fn is_renderable(bbox: &BoundingBox) -> bool {
    bbox.width > 0.0 && bbox.height > 0.0
}

/// Scale a normalized box onto a surface of `surface_width` x `surface_height` pixels
pub fn to_surface_rect(bbox: &BoundingBox, surface_width: f64, surface_height: f64) -> SurfaceRect {
    SurfaceRect {
        x: bbox.x * surface_width,
        y: bbox.y * surface_height,
        width: bbox.width * surface_width,
        height: bbox.height * surface_height,
    }
}

/// Map a normalized box into PDF user space as `[x0, y0, x1, y1]`
/// (lower-left, upper-right). `media_box` is `[x, y, width, height]` in points.
pub fn to_pdf_rect(bbox: &BoundingBox, media_box: [f64; 4]) -> [f64; 4] {
    let [mb_x, mb_y, mb_width, mb_height] = media_box;
    let top = mb_y + mb_height * (1.0 - bbox.y);
    let bottom = mb_y + mb_height * (1.0 - bbox.bottom());
    [
        mb_x + mb_width * bbox.x,
        bottom,
        mb_x + mb_width * bbox.right(),
        top,
    ]
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        1.0f64..2000.0
    }

    fn unit() -> impl Strategy<Value = f64> {
        0.0f64..1.0
    }

    proptest! {
        /// Property: surface and PDF mappings agree on box size
        #[test]
        fn pdf_and_surface_sizes_agree(
            x in unit(),
            y in unit(),
            w in 0.0f64..0.5,
            h in 0.0f64..0.5,
            pdf_w in dimension(),
            pdf_h in dimension(),
        ) {
            let bbox = BoundingBox { page: 1, x: x * 0.5, y: y * 0.5, width: w, height: h };
            let rect = to_surface_rect(&bbox, pdf_w, pdf_h);
            let [x0, y0, x1, y1] = to_pdf_rect(&bbox, [0.0, 0.0, pdf_w, pdf_h]);

            let tolerance = 0.0001;
            prop_assert!((rect.width - (x1 - x0)).abs() < tolerance);
            prop_assert!((rect.height - (y1 - y0)).abs() < tolerance);
            // Surface y runs down from the top edge; PDF y runs up from the bottom
            prop_assert!((rect.y - (pdf_h - y1)).abs() < tolerance);
        }

        /// Property: PDF rects are well ordered and stay inside the media box
        #[test]
        fn pdf_rect_inside_media_box(
            x in unit(),
            y in unit(),
            w in 0.0f64..0.5,
            h in 0.0f64..0.5,
            offset_x in 0.0f64..100.0,
            offset_y in 0.0f64..100.0,
            pdf_w in dimension(),
            pdf_h in dimension(),
        ) {
            let bbox = BoundingBox { page: 1, x: x * 0.5, y: y * 0.5, width: w, height: h };
            let media_box = [offset_x, offset_y, pdf_w, pdf_h];
            let [x0, y0, x1, y1] = to_pdf_rect(&bbox, media_box);

            let tolerance = 0.0001;
            prop_assert!(x0 <= x1 + tolerance && y0 <= y1 + tolerance);
            prop_assert!(x0 >= offset_x - tolerance && x1 <= offset_x + pdf_w + tolerance);
            prop_assert!(y0 >= offset_y - tolerance && y1 <= offset_y + pdf_h + tolerance);
        }

        /// Property: surface scaling is linear in the surface size
        #[test]
        fn surface_rect_linear(
            x in unit(),
            y in unit(),
            surface_w in dimension(),
            surface_h in dimension(),
        ) {
            let bbox = BoundingBox { page: 1, x, y, width: 0.0, height: 0.0 };
            let single = to_surface_rect(&bbox, surface_w, surface_h);
            let double = to_surface_rect(&bbox, surface_w * 2.0, surface_h * 2.0);
            prop_assert!((double.x - 2.0 * single.x).abs() < 0.0001);
            prop_assert!((double.y - 2.0 * single.y).abs() < 0.0001);
        }
    }
}
