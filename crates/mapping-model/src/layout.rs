//! Deterministic category layout.
//!
//! The canvas is split into four fixed regions: property sets on the left at
//! full height, properties, quantities and classifications stacked on the
//! right. Inside a region, sources sit in a column at a quarter of the
//! region width and targets at three quarters, each list top-aligned under
//! the header. The same catalog always produces the same positions.

use crate::catalog::{CategoryItems, Catalog};
use crate::category::{Category, Role, CLASSIFICATION_TARGET_ID};
use crate::node::MappingNode;
use serde::{Deserialize, Serialize};

pub const CANVAS_HEIGHT: f32 = 1500.0;
pub const NODE_WIDTH: f32 = 220.0;
pub const NODE_HEIGHT: f32 = 80.0;
pub const VERTICAL_GAP: f32 = 15.0;
pub const HEADER_HEIGHT: f32 = 40.0;
pub const TOP_PADDING: f32 = 15.0;
/// Region width fits three node widths plus breathing room.
pub const REGION_WIDTH: f32 = NODE_WIDTH * 3.0 + 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One of the four fixed canvas regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub category: Category,
    pub origin: Point,
    pub width: f32,
    pub height: f32,
}

impl Region {
    /// Clamp an absolute position so a node of the standard size stays
    /// inside the region, below the header.
    pub fn clamp(&self, p: Point) -> Point {
        let min_x = self.origin.x;
        let max_x = self.origin.x + self.width - NODE_WIDTH;
        let min_y = self.origin.y + HEADER_HEIGHT;
        let max_y = self.origin.y + self.height - NODE_HEIGHT;
        Point::new(p.x.clamp(min_x, max_x), p.y.clamp(min_y, max_y))
    }
}

/// Region geometry of every category, in drawing order.
pub fn regions() -> [Region; 4] {
    [
        Region {
            category: Category::PropertySet,
            origin: Point::new(20.0, 50.0),
            width: REGION_WIDTH,
            height: CANVAS_HEIGHT - 100.0,
        },
        Region {
            category: Category::Property,
            origin: Point::new(850.0, 50.0),
            width: REGION_WIDTH,
            height: 400.0,
        },
        Region {
            category: Category::Quantity,
            origin: Point::new(850.0, 500.0),
            width: REGION_WIDTH,
            height: 400.0,
        },
        Region {
            category: Category::Classification,
            origin: Point::new(850.0, 950.0),
            width: REGION_WIDTH,
            height: 500.0,
        },
    ]
}

pub fn region(category: Category) -> Region {
    let index = Category::ALL.iter().position(|c| *c == category).unwrap_or(0);
    regions()[index]
}

/// X offset of the source column inside a region.
pub fn source_column_x() -> f32 {
    REGION_WIDTH * 0.25 - NODE_WIDTH / 2.0
}

/// X offset of the target column inside a region.
pub fn target_column_x() -> f32 {
    REGION_WIDTH * 0.75 - NODE_WIDTH / 2.0
}

pub fn column_x(role: Role) -> f32 {
    match role {
        Role::Source => source_column_x(),
        Role::Target => target_column_x(),
    }
}

/// Y offset of the `index`-th row inside a region, below the header.
pub fn row_y(index: usize) -> f32 {
    HEADER_HEIGHT + TOP_PADDING + (NODE_HEIGHT + VERTICAL_GAP) * index as f32
}

/// A node together with its region-relative position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub node: MappingNode,
    pub position: Point,
}

/// Lay out one category: sources top-aligned in the left column, targets in
/// the right, one row per list index.
pub fn layout_category(category: Category, items: &CategoryItems) -> Vec<PlacedNode> {
    let mut placed = Vec::with_capacity(items.sources.len() + items.targets.len());
    for (row, item) in items.sources.iter().enumerate() {
        placed.push(PlacedNode {
            node: MappingNode::supplied(category, Role::Source, item),
            position: Point::new(source_column_x(), row_y(row)),
        });
    }
    if category == Category::Classification {
        // Single fixed target slot, regardless of the catalog.
        placed.push(PlacedNode {
            node: MappingNode::supplied(
                category,
                Role::Target,
                &crate::catalog::CatalogItem::new(CLASSIFICATION_TARGET_ID, "IFC Classification"),
            ),
            position: Point::new(target_column_x(), row_y(0)),
        });
    } else {
        for (row, item) in items.targets.iter().enumerate() {
            placed.push(PlacedNode {
                node: MappingNode::supplied(category, Role::Target, item),
                position: Point::new(target_column_x(), row_y(row)),
            });
        }
    }
    placed
}

/// Lay out the whole catalog, category by category in region order.
pub fn layout_catalog(catalog: &Catalog) -> Vec<(Region, Vec<PlacedNode>)> {
    regions()
        .into_iter()
        .map(|r| (r, layout_category(r.category, catalog.items(r.category))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;

    fn items(sources: &[&str], targets: &[&str]) -> CategoryItems {
        CategoryItems {
            sources: sources.iter().map(|s| CatalogItem::simple(*s)).collect(),
            targets: targets.iter().map(|s| CatalogItem::simple(*s)).collect(),
        }
    }

    #[test]
    fn two_sources_one_target_occupy_expected_rows() {
        let placed = layout_category(Category::PropertySet, &items(&["A", "B"], &["X"]));
        assert_eq!(placed.len(), 3);

        let a = &placed[0];
        let b = &placed[1];
        let x = &placed[2];
        assert_eq!(a.position, Point::new(source_column_x(), row_y(0)));
        assert_eq!(b.position, Point::new(source_column_x(), row_y(1)));
        assert_eq!(x.position, Point::new(target_column_x(), row_y(0)));

        // Rows do not overlap vertically.
        assert!(b.position.y - a.position.y >= NODE_HEIGHT);
        // Columns do not overlap horizontally.
        assert!(x.position.x - a.position.x >= NODE_WIDTH);
    }

    #[test]
    fn layout_is_deterministic() {
        let it = items(&["A", "B", "C"], &["X", "Y"]);
        assert_eq!(
            layout_category(Category::Property, &it),
            layout_category(Category::Property, &it)
        );
    }

    #[test]
    fn empty_category_still_has_a_region() {
        let placed = layout_category(Category::Quantity, &items(&[], &[]));
        assert!(placed.is_empty());
        let r = region(Category::Quantity);
        assert_eq!(r.origin, Point::new(850.0, 500.0));
        assert_eq!(r.height, 400.0);
    }

    #[test]
    fn classification_always_has_exactly_one_target() {
        let placed = layout_category(Category::Classification, &items(&["name"], &["a", "b", "c"]));
        let targets: Vec<_> = placed
            .iter()
            .filter(|p| p.node.role() == Some(Role::Target))
            .collect();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].node.id, "target-classification");
    }

    #[test]
    fn regions_do_not_overlap() {
        let rs = regions();
        for (i, a) in rs.iter().enumerate() {
            for b in rs.iter().skip(i + 1) {
                let horizontal = a.origin.x + a.width <= b.origin.x || b.origin.x + b.width <= a.origin.x;
                let vertical = a.origin.y + a.height <= b.origin.y || b.origin.y + b.height <= a.origin.y;
                assert!(horizontal || vertical, "{:?} overlaps {:?}", a.category, b.category);
            }
        }
    }

    #[test]
    fn clamp_keeps_nodes_inside_and_below_the_header() {
        let r = region(Category::Property);
        let p = r.clamp(Point::new(0.0, 0.0));
        assert!(p.x >= r.origin.x);
        assert!(p.y >= r.origin.y + HEADER_HEIGHT);
        let p = r.clamp(Point::new(10_000.0, 10_000.0));
        assert!(p.x + NODE_WIDTH <= r.origin.x + r.width);
        assert!(p.y + NODE_HEIGHT <= r.origin.y + r.height);
    }
}
