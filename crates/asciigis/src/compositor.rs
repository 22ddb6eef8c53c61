//! Layer compositing: raster images in, one glyph grid out.
//!
//! Every visible vector layer is rendered in isolation by the engine,
//! reduced to a glyph-or-empty cell per output coordinate (one source
//! pixel per cell), and the per-layer grids are stacked bottom to top
//! with the topmost non-empty cell winning. Pure painter's algorithm:
//! ties resolve by z-order, never by blending.

use tracing::debug;

use crate::engine::{RasterImage, RenderEngine};
use crate::palette::ColorAssignment;
use crate::project::{GeometryKind, LayerTree};
use crate::viewport::MapExtent;

/// One output cell: a glyph and the palette slot to draw it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphCell {
    pub glyph: char,
    pub slot: u8,
}

/// Sentinel for "no opaque feature here".
pub const EMPTY: GlyphCell = GlyphCell {
    glyph: ' ',
    slot: 0,
};

impl GlyphCell {
    /// A blank glyph is empty regardless of its slot.
    pub fn is_empty(&self) -> bool {
        self.glyph == ' '
    }
}

/// Row-major grid of cells, rebuilt whole on every composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: usize,
    height: usize,
    cells: Vec<GlyphCell>,
}

impl CellGrid {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> GlyphCell {
        if x >= self.width || y >= self.height {
            return EMPTY;
        }
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, cell: GlyphCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }
}

/// Fixed geometry-to-glyph table.
pub fn type_glyph(kind: GeometryKind) -> char {
    match kind {
        GeometryKind::Point => '@',
        GeometryKind::Line => '.',
        GeometryKind::Polygon => '#',
        GeometryKind::Unknown => ' ',
    }
}

/// Reduce one layer's raster to a glyph grid. A pixel is opaque when it
/// differs from the image's background color; one pixel per cell.
pub fn layer_grid(
    image: Option<&RasterImage>,
    glyph: char,
    slot: u8,
    width: usize,
    height: usize,
) -> CellGrid {
    let mut grid = CellGrid::empty(width, height);
    let Some(image) = image else {
        return grid;
    };
    let background = image.background();
    for y in 0..height {
        for x in 0..width {
            if image.pixel(x as u32, y as u32) != background {
                grid.set(x, y, GlyphCell { glyph, slot });
            }
        }
    }
    grid
}

/// Stack per-layer grids given bottom first; the last non-empty cell at
/// each coordinate wins.
pub fn stack(grids: &[CellGrid], width: usize, height: usize) -> CellGrid {
    let mut out = CellGrid::empty(width, height);
    for y in 0..height {
        for x in 0..width {
            for grid in grids.iter().rev() {
                let cell = grid.get(x, y);
                if !cell.is_empty() {
                    out.set(x, y, cell);
                    break;
                }
            }
        }
    }
    out
}

/// Composite every visible vector layer into one grid.
///
/// Layers that fail to render contribute an all-empty grid; the composite
/// always completes.
pub fn composite(
    tree: &LayerTree,
    engine: &dyn RenderEngine,
    colors: &ColorAssignment,
    extent: &MapExtent,
    width: usize,
    height: usize,
) -> CellGrid {
    let mut layers = tree.visible_layers();
    layers.reverse(); // bottom first
    debug!(layers = layers.len(), width, height, "compositing");

    let grids: Vec<CellGrid> = layers
        .iter()
        .map(|layer| {
            let image = engine.render_layer(layer, extent, width as u32, height as u32);
            layer_grid(
                image.as_ref(),
                type_glyph(layer.geometry),
                colors.slot(layer.id),
                width,
                height,
            )
        })
        .collect();
    stack(&grids, width, height)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{composite, layer_grid, stack, type_glyph, CellGrid, GlyphCell, EMPTY};
    use crate::engine::{RasterImage, RenderEngine, BLACK, WHITE};
    use crate::palette;
    use crate::project::{GeometryKind, Layer, LayerNode, LayerTree, NodeId};
    use crate::viewport::MapExtent;

    /// Engine that paints a fixed set of opaque pixels per layer id.
    struct FakeEngine {
        masks: HashMap<NodeId, Vec<(u32, u32)>>,
    }

    impl RenderEngine for FakeEngine {
        fn render_layer(
            &self,
            layer: &Layer,
            _extent: &MapExtent,
            width: u32,
            height: u32,
        ) -> Option<RasterImage> {
            let mask = self.masks.get(&layer.id)?;
            let mut image = RasterImage::filled(width, height, WHITE);
            for (x, y) in mask {
                image.set_pixel(i64::from(*x), i64::from(*y), BLACK);
            }
            Some(image)
        }
    }

    fn point_layer(id: NodeId, name: &str) -> LayerNode {
        LayerNode::Layer(Layer {
            id,
            name: name.to_string(),
            visible: true,
            geometry: GeometryKind::Point,
            features: vec![vec![[0.0, 0.0]]],
        })
    }

    fn tree_of(nodes: Vec<LayerNode>) -> LayerTree {
        LayerTree { nodes }
    }

    fn extent() -> MapExtent {
        MapExtent::new(0.0, 0.0, 4.0, 4.0)
    }

    fn cell(glyph: char, slot: u8) -> GlyphCell {
        GlyphCell { glyph, slot }
    }

    #[test]
    fn glyph_table_is_exact() {
        assert_eq!(type_glyph(GeometryKind::Point), '@');
        assert_eq!(type_glyph(GeometryKind::Line), '.');
        assert_eq!(type_glyph(GeometryKind::Polygon), '#');
        assert_eq!(type_glyph(GeometryKind::Unknown), ' ');
    }

    #[test]
    fn topmost_non_empty_layer_wins() {
        // Tree order is top first: layer 1 on top of layer 2.
        let tree = tree_of(vec![point_layer(1, "top"), point_layer(2, "bottom")]);
        let engine = FakeEngine {
            masks: HashMap::from([
                (1, vec![(0, 0)]),
                (2, vec![(0, 0), (1, 0)]),
            ]),
        };
        let colors = palette::assign(&tree.layer_ids_bottom_up());

        let grid = composite(&tree, &engine, &colors, &extent(), 4, 4);
        // Both layers are opaque at (0,0): the topmost wins.
        assert_eq!(grid.get(0, 0).slot, colors.slot(1));
        // Only the bottom layer is opaque at (1,0).
        assert_eq!(grid.get(1, 0).slot, colors.slot(2));
        // Nothing anywhere else.
        assert_eq!(grid.get(2, 2), EMPTY);
    }

    #[test]
    fn all_empty_coordinates_stay_empty() {
        let grids = vec![CellGrid::empty(3, 3), CellGrid::empty(3, 3)];
        let stacked = stack(&grids, 3, 3);
        for y in 0..3 {
            for x in 0..3 {
                assert!(stacked.get(x, y).is_empty());
            }
        }
    }

    #[test]
    fn stack_ignores_blank_glyph_cells_from_upper_layers() {
        let mut bottom = CellGrid::empty(2, 1);
        bottom.set(0, 0, cell('#', 3));
        // Upper layer has a blank glyph with a non-zero slot; still empty.
        let mut top = CellGrid::empty(2, 1);
        top.set(0, 0, cell(' ', 5));
        let stacked = stack(&[bottom, top], 2, 1);
        assert_eq!(stacked.get(0, 0), cell('#', 3));
    }

    #[test]
    fn failed_layer_contributes_empty_grid() {
        let tree = tree_of(vec![point_layer(1, "broken"), point_layer(2, "fine")]);
        // No mask registered for layer 1: engine returns None.
        let engine = FakeEngine {
            masks: HashMap::from([(2, vec![(2, 2)])]),
        };
        let colors = palette::assign(&tree.layer_ids_bottom_up());

        let grid = composite(&tree, &engine, &colors, &extent(), 4, 4);
        assert_eq!(grid.get(2, 2).slot, colors.slot(2));
        assert_eq!(grid.get(0, 0), EMPTY);
    }

    #[test]
    fn toggling_visibility_changes_only_that_layer() {
        let engine = FakeEngine {
            masks: HashMap::from([
                (1, vec![(0, 0)]),
                (2, vec![(1, 1)]),
            ]),
        };
        let mut tree = tree_of(vec![point_layer(1, "a"), point_layer(2, "b")]);
        let colors = palette::assign(&tree.layer_ids_bottom_up());

        let before = composite(&tree, &engine, &colors, &extent(), 4, 4);
        tree.find_mut(1).expect("layer").toggle_visible();
        let after = composite(&tree, &engine, &colors, &extent(), 4, 4);

        assert!(!before.get(0, 0).is_empty());
        assert!(after.get(0, 0).is_empty());
        // Layer 2's contribution is untouched.
        assert_eq!(before.get(1, 1), after.get(1, 1));
    }

    #[test]
    fn unknown_geometry_renders_blank_even_when_opaque() {
        let mut image = RasterImage::filled(2, 2, WHITE);
        image.set_pixel(0, 0, BLACK);
        let grid = layer_grid(Some(&image), type_glyph(GeometryKind::Unknown), 1, 2, 2);
        // The cell was opaque, but a blank glyph never contributes.
        assert!(grid.get(0, 0).is_empty());
    }

    #[test]
    fn grid_reads_out_of_bounds_as_empty() {
        let grid = CellGrid::empty(2, 2);
        assert_eq!(grid.get(10, 10), EMPTY);
    }
}
