//! Binary region masks rasterized from scene polygons

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::region::{NormalizedRegion, PixelPoint};
use crate::GeometryError;

/// Binary occupancy raster over the frame's pixel grid.
///
/// A pixel is set when it lies on or inside any of the source polygons
/// (boundary inclusive). Rebuilding from the same input yields an
/// identical mask.
#[derive(Debug, Clone)]
pub struct RegionMask {
    raster: GrayImage,
}

impl RegionMask {
    /// Rasterize one or more normalized polygons into a single union mask
    /// of shape (height, width).
    pub fn build(
        regions: &[NormalizedRegion],
        width: u32,
        height: u32,
    ) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidRaster { width, height });
        }

        let mut raster = GrayImage::new(width, height);
        for region in regions {
            let mut poly: Vec<Point<i32>> = region
                .denormalize(width, height)
                .iter()
                .map(|p| Point::new(p.x, p.y))
                .collect();

            // The polygon filler wants an open representation.
            if poly.len() > 1 && poly.first() == poly.last() {
                poly.pop();
            }
            if poly.len() < 3 {
                tracing::debug!(points = poly.len(), "skipping degenerate polygon");
                continue;
            }
            draw_polygon_mut(&mut raster, &poly, Luma([1u8]));
        }
        Ok(Self { raster })
    }

    /// Whether the point is inside the rasterized region.
    /// Points outside the raster extent are never contained; detections
    /// near frame edges are expected.
    pub fn contains(&self, point: PixelPoint) -> bool {
        if point.x < 0 || point.y < 0 {
            return false;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x >= self.raster.width() || y >= self.raster.height() {
            return false;
        }
        self.raster.get_pixel(x, y)[0] != 0
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Number of set pixels, mostly useful for diagnostics
    pub fn area_px(&self) -> u64 {
        self.raster.pixels().filter(|p| p[0] != 0).count() as u64
    }
}
