//! Rendering engine interface and the built-in feature rasterizer.
//!
//! The compositor only ever talks to the `RenderEngine` trait: one layer,
//! one extent, one pixel size in, one raster image out. The bundled
//! `FeatureRasterizer` draws project features in black on a white
//! background at cell resolution, which is all the glyph reduction needs.
//! No antialiasing, no symbology.

use tracing::debug;

use crate::project::{Coord, GeometryKind, Layer};
use crate::viewport::MapExtent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// A rasterized single-layer image. Pixels outside the bounds read as the
/// background color, so callers can sample without bounds checks.
#[derive(Debug, Clone)]
pub struct RasterImage {
    width: u32,
    height: u32,
    background: Rgb,
    pixels: Vec<Rgb>,
}

impl RasterImage {
    pub fn filled(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            pixels: vec![background; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        if x >= self.width || y >= self.height {
            return self.background;
        }
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = color;
    }
}

/// External rendering collaborator: rasterize exactly one layer.
///
/// Returning `None` means the layer could not be rendered (no geometry,
/// degenerate extent); the compositor treats that as an all-empty
/// contribution, never as an error.
pub trait RenderEngine {
    fn render_layer(
        &self,
        layer: &Layer,
        extent: &MapExtent,
        width: u32,
        height: u32,
    ) -> Option<RasterImage>;
}

/// Built-in engine: plots points, Bresenham polylines, and even-odd
/// filled polygons from the project's inline feature coordinates.
#[derive(Debug, Default)]
pub struct FeatureRasterizer;

impl RenderEngine for FeatureRasterizer {
    fn render_layer(
        &self,
        layer: &Layer,
        extent: &MapExtent,
        width: u32,
        height: u32,
    ) -> Option<RasterImage> {
        if width == 0 || height == 0 {
            return None;
        }
        if extent.width() <= 0.0 || extent.height() <= 0.0 {
            return None;
        }
        if layer.features.is_empty() {
            return None;
        }

        let mut image = RasterImage::filled(width, height, WHITE);
        let to_pixel = |coord: &Coord| -> (f64, f64) {
            let px = (coord[0] - extent.xmin) / extent.width() * f64::from(width);
            let py = (extent.ymax - coord[1]) / extent.height() * f64::from(height);
            (px, py)
        };

        for path in &layer.features {
            match layer.geometry {
                GeometryKind::Point => {
                    for coord in path {
                        let (px, py) = to_pixel(coord);
                        image.set_pixel(px.floor() as i64, py.floor() as i64, BLACK);
                    }
                }
                GeometryKind::Line => {
                    draw_polyline(&mut image, path, &to_pixel);
                }
                GeometryKind::Polygon => {
                    fill_polygon(&mut image, path, &to_pixel);
                    draw_polyline(&mut image, path, &to_pixel);
                    if let (Some(first), Some(last)) = (path.first(), path.last()) {
                        if first != last {
                            draw_segment(&mut image, to_pixel(last), to_pixel(first));
                        }
                    }
                }
                GeometryKind::Unknown => {}
            }
        }
        debug!(layer = %layer.name, width, height, "rasterized layer");
        Some(image)
    }
}

fn draw_polyline(image: &mut RasterImage, path: &[Coord], to_pixel: &dyn Fn(&Coord) -> (f64, f64)) {
    for pair in path.windows(2) {
        draw_segment(image, to_pixel(&pair[0]), to_pixel(&pair[1]));
    }
}

fn draw_segment(image: &mut RasterImage, from: (f64, f64), to: (f64, f64)) {
    let (mut x0, mut y0) = (from.0.floor() as i64, from.1.floor() as i64);
    let (x1, y1) = (to.0.floor() as i64, to.1.floor() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let step_x = if x0 < x1 { 1 } else { -1 };
    let step_y = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        image.set_pixel(x0, y0, BLACK);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x0 += step_x;
        }
        if doubled <= dx {
            err += dx;
            y0 += step_y;
        }
    }
}

/// Even-odd scanline fill over the ring in pixel space.
fn fill_polygon(image: &mut RasterImage, ring: &[Coord], to_pixel: &dyn Fn(&Coord) -> (f64, f64)) {
    if ring.len() < 3 {
        return;
    }
    let points: Vec<(f64, f64)> = ring.iter().map(to_pixel).collect();

    for row in 0..image.height() {
        let scan_y = f64::from(row) + 0.5;
        let mut crossings: Vec<f64> = Vec::new();
        for index in 0..points.len() {
            let (x0, y0) = points[index];
            let (x1, y1) = points[(index + 1) % points.len()];
            if (y0 <= scan_y && y1 > scan_y) || (y1 <= scan_y && y0 > scan_y) {
                let t = (scan_y - y0) / (y1 - y0);
                crossings.push(x0 + t * (x1 - x0));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for span in crossings.chunks_exact(2) {
            let start = span[0].ceil() as i64;
            let end = span[1].floor() as i64;
            for x in start..=end {
                image.set_pixel(x, i64::from(row), BLACK);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureRasterizer, RenderEngine, BLACK, WHITE};
    use crate::project::{GeometryKind, Layer};
    use crate::viewport::MapExtent;

    fn layer(geometry: GeometryKind, features: Vec<Vec<[f64; 2]>>) -> Layer {
        Layer {
            id: 1,
            name: "probe".to_string(),
            visible: true,
            geometry,
            features,
        }
    }

    #[test]
    fn point_lands_on_expected_pixel() {
        let extent = MapExtent::new(0.0, 0.0, 10.0, 10.0);
        let layer = layer(GeometryKind::Point, vec![vec![[2.5, 7.5]]]);
        let image = FeatureRasterizer
            .render_layer(&layer, &extent, 10, 10)
            .expect("image");

        // x=2.5 maps to column 2; y=7.5 (near the top) maps to row 2.
        assert_eq!(image.pixel(2, 2), BLACK);
        assert_eq!(image.pixel(3, 2), WHITE);
        assert_eq!(image.background(), WHITE);
    }

    #[test]
    fn line_connects_endpoints() {
        let extent = MapExtent::new(0.0, 0.0, 8.0, 8.0);
        let layer = layer(
            GeometryKind::Line,
            vec![vec![[0.5, 4.0], [7.5, 4.0]]],
        );
        let image = FeatureRasterizer
            .render_layer(&layer, &extent, 8, 8)
            .expect("image");
        for x in 0..8 {
            assert_eq!(image.pixel(x, 4), BLACK, "gap at column {x}");
        }
    }

    #[test]
    fn polygon_interior_is_filled() {
        let extent = MapExtent::new(0.0, 0.0, 10.0, 10.0);
        let layer = layer(
            GeometryKind::Polygon,
            vec![vec![[1.0, 1.0], [9.0, 1.0], [9.0, 9.0], [1.0, 9.0]]],
        );
        let image = FeatureRasterizer
            .render_layer(&layer, &extent, 10, 10)
            .expect("image");
        assert_eq!(image.pixel(5, 5), BLACK);
        assert_eq!(image.pixel(0, 0), WHITE);
    }

    #[test]
    fn features_outside_extent_are_clipped() {
        let extent = MapExtent::new(0.0, 0.0, 10.0, 10.0);
        let layer = layer(GeometryKind::Point, vec![vec![[-5.0, 50.0]]]);
        let image = FeatureRasterizer
            .render_layer(&layer, &extent, 10, 10)
            .expect("image");
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(image.pixel(x, y), WHITE);
            }
        }
    }

    #[test]
    fn empty_layer_and_zero_size_yield_none() {
        let extent = MapExtent::new(0.0, 0.0, 10.0, 10.0);
        let empty = layer(GeometryKind::Point, vec![]);
        assert!(FeatureRasterizer
            .render_layer(&empty, &extent, 10, 10)
            .is_none());

        let some = layer(GeometryKind::Point, vec![vec![[1.0, 1.0]]]);
        assert!(FeatureRasterizer
            .render_layer(&some, &extent, 0, 10)
            .is_none());
    }

    #[test]
    fn out_of_bounds_reads_return_background() {
        let extent = MapExtent::new(0.0, 0.0, 4.0, 4.0);
        let layer = layer(GeometryKind::Point, vec![vec![[1.0, 1.0]]]);
        let image = FeatureRasterizer
            .render_layer(&layer, &extent, 4, 4)
            .expect("image");
        assert_eq!(image.pixel(99, 99), WHITE);
    }
}
