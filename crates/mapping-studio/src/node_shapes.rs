use eframe::egui::{
    self, Color32, CornerRadius, FontFamily, FontId, Pos2, Shape, Stroke,
    Vec2,
    epaint::{RectShape, TextShape},
};
use egui_graphs::{DisplayNode, DrawContext, NodeProps};
use mapping_model::layout::{HEADER_HEIGHT, NODE_HEIGHT, NODE_WIDTH};
use mapping_model::{Category, MappingNode, NodeKind, Role};
use petgraph::{EdgeType, stable_graph::IndexType};
use serde::{Deserialize, Serialize};

const SOURCE_FILL: Color32 = Color32::from_rgb(219, 234, 254);
const TARGET_FILL: Color32 = Color32::from_rgb(220, 252, 231);
const FILTER_FILL: Color32 = Color32::from_rgb(254, 243, 199);
const REGION_STROKE: Color32 = Color32::from_rgb(148, 163, 184);
const LABEL_COLOR: Color32 = Color32::from_rgb(30, 41, 59);
const SUBLABEL_COLOR: Color32 = Color32::from_rgb(100, 116, 139);
const SELECTED_STROKE: Color32 = Color32::from_rgb(180, 50, 60);

const LABEL_FONT: f32 = 14.0;
const SUBLABEL_FONT: f32 = 11.0;
const HEADER_FONT: f32 = 18.0;

fn fill_for(node: &MappingNode) -> Color32 {
    match node.kind {
        NodeKind::Mapping { role: Role::Source, .. } => SOURCE_FILL,
        NodeKind::Mapping { role: Role::Target, .. } => TARGET_FILL,
        NodeKind::ClassFilter => FILTER_FILL,
        NodeKind::Region { .. } => Color32::TRANSPARENT,
    }
}

fn sublabel_for(node: &MappingNode) -> Option<String> {
    match node.kind {
        NodeKind::Mapping { category: Category::Property, role: Role::Source } => {
            node.attrs.pset.clone()
        }
        NodeKind::Mapping { category: Category::Quantity, .. } => node.attrs.unit.clone(),
        NodeKind::Mapping { category: Category::Classification, role: Role::Source } => {
            node.attrs.subtype.clone()
        }
        NodeKind::ClassFilter => Some(format!("{} classes", node.attrs.selected_classes.len())),
        _ => None,
    }
}

/// Rectangular card for mapping and filter nodes; category regions render
/// as large outlined boxes with a header and are transparent to hit tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MappingNodeShape {
    pos: Pos2,
    selected: bool,
    hovered: bool,
    label_text: String,
    sublabel: Option<String>,
    fill: Color32,
    is_region: bool,
    size: Vec2,
}

impl From<NodeProps<MappingNode>> for MappingNodeShape {
    fn from(props: NodeProps<MappingNode>) -> Self {
        let node = &props.payload;
        let size = match node.kind {
            NodeKind::Region { category } => {
                let r = mapping_model::layout::region(category);
                Vec2::new(r.width, r.height)
            }
            _ => Vec2::new(NODE_WIDTH, NODE_HEIGHT),
        };
        Self {
            pos: props.location(),
            selected: props.selected,
            hovered: props.hovered,
            label_text: props.label.clone(),
            sublabel: sublabel_for(node),
            fill: fill_for(node),
            is_region: node.is_region(),
            size,
        }
    }
}

impl<E: Clone, Ty: EdgeType, Ix: IndexType> DisplayNode<MappingNode, E, Ty, Ix>
    for MappingNodeShape
{
    fn closest_boundary_point(&self, dir: Vec2) -> Pos2 {
        let half = self.size / 2.0;
        if dir.length_sq() < f32::EPSILON {
            return self.pos + Vec2::new(half.x, 0.0);
        }
        // Ray from the center to the rectangle border.
        let scale_x = if dir.x.abs() < f32::EPSILON {
            f32::INFINITY
        } else {
            half.x / dir.x.abs()
        };
        let scale_y = if dir.y.abs() < f32::EPSILON {
            f32::INFINITY
        } else {
            half.y / dir.y.abs()
        };
        self.pos + dir * scale_x.min(scale_y)
    }

    fn shapes(&mut self, ctx: &DrawContext) -> Vec<Shape> {
        if self.is_region {
            return self.region_shapes(ctx);
        }

        let mut res = Vec::with_capacity(3);
        let center = ctx.meta.canvas_to_screen_pos(self.pos);
        let half = Vec2::new(
            ctx.meta.canvas_to_screen_size(self.size.x / 2.0),
            ctx.meta.canvas_to_screen_size(self.size.y / 2.0),
        );
        let rect = egui::Rect::from_min_max(center - half, center + half);

        let stroke = if self.selected {
            Stroke::new(3.0, SELECTED_STROKE)
        } else if self.hovered {
            Stroke::new(2.0, LABEL_COLOR)
        } else {
            Stroke::new(1.0, SUBLABEL_COLOR)
        };
        res.push(
            RectShape::new(
                rect,
                CornerRadius::same(6),
                self.fill,
                stroke,
                egui::StrokeKind::Inside,
            )
            .into(),
        );

        let label_font = ctx.meta.canvas_to_screen_size(LABEL_FONT);
        let galley = ctx.ctx.fonts_mut(|f| {
            f.layout_no_wrap(
                self.label_text.clone(),
                FontId::new(label_font, FontFamily::Proportional),
                LABEL_COLOR,
            )
        });
        let label_offset = if self.sublabel.is_some() {
            Vec2::new(0.0, -galley.size().y * 0.6)
        } else {
            Vec2::ZERO
        };
        let label_pos = Pos2::new(
            center.x - galley.size().x / 2.0,
            center.y - galley.size().y / 2.0,
        ) + label_offset;
        res.push(TextShape::new(label_pos, galley, LABEL_COLOR).into());

        if let Some(sub) = &self.sublabel {
            let sub_font = ctx.meta.canvas_to_screen_size(SUBLABEL_FONT);
            let galley = ctx.ctx.fonts_mut(|f| {
                f.layout_no_wrap(
                    sub.clone(),
                    FontId::new(sub_font, FontFamily::Proportional),
                    SUBLABEL_COLOR,
                )
            });
            let sub_pos = Pos2::new(
                center.x - galley.size().x / 2.0,
                center.y + ctx.meta.canvas_to_screen_size(4.0),
            );
            res.push(TextShape::new(sub_pos, galley, SUBLABEL_COLOR).into());
        }

        res
    }

    fn update(&mut self, state: &NodeProps<MappingNode>) {
        self.pos = state.location();
        self.selected = state.selected;
        self.hovered = state.hovered;
        self.label_text = state.label.clone();
        self.sublabel = sublabel_for(&state.payload);
        self.fill = fill_for(&state.payload);
    }

    fn is_inside(&self, pos: Pos2) -> bool {
        // Regions are structural: never hoverable, selectable or deletable
        // through canvas interactions.
        if self.is_region {
            return false;
        }
        let half = self.size / 2.0;
        (pos.x - self.pos.x).abs() <= half.x && (pos.y - self.pos.y).abs() <= half.y
    }
}

impl MappingNodeShape {
    fn region_shapes(&self, ctx: &DrawContext) -> Vec<Shape> {
        let mut res = Vec::with_capacity(3);
        let center = ctx.meta.canvas_to_screen_pos(self.pos);
        let half = Vec2::new(
            ctx.meta.canvas_to_screen_size(self.size.x / 2.0),
            ctx.meta.canvas_to_screen_size(self.size.y / 2.0),
        );
        let rect = egui::Rect::from_min_max(center - half, center + half);

        res.push(
            RectShape::new(
                rect,
                CornerRadius::same(8),
                Color32::from_rgba_unmultiplied(148, 163, 184, 12),
                Stroke::new(1.5, REGION_STROKE),
                egui::StrokeKind::Inside,
            )
            .into(),
        );

        let header_h = ctx.meta.canvas_to_screen_size(HEADER_HEIGHT);
        res.push(Shape::line_segment(
            [
                Pos2::new(rect.min.x, rect.min.y + header_h),
                Pos2::new(rect.max.x, rect.min.y + header_h),
            ],
            Stroke::new(1.0, REGION_STROKE),
        ));

        let font = ctx.meta.canvas_to_screen_size(HEADER_FONT);
        let galley = ctx.ctx.fonts_mut(|f| {
            f.layout_no_wrap(
                self.label_text.clone(),
                FontId::new(font, FontFamily::Proportional),
                LABEL_COLOR,
            )
        });
        let title_pos = Pos2::new(
            rect.min.x + ctx.meta.canvas_to_screen_size(12.0),
            rect.min.y + (header_h - galley.size().y) / 2.0,
        );
        res.push(TextShape::new(title_pos, galley, LABEL_COLOR).into());

        res
    }
}
