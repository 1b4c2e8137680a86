//! Node and edge id derivation.
//!
//! Pre-supplied node ids embed the role, the category prefix and the
//! business identifier (`source-pset-Custom_Pset_1`). User-authored ids
//! embed a creation timestamp instead (`custom-source-pset-1712`), so the
//! business identifier of a custom node is recovered from its label, never
//! from the id suffix. Edge ids are deterministic per category, which makes
//! configuration-driven rebuilds idempotent.

use crate::category::{Category, Role, CLASSIFICATION_TARGET_ID};
use crate::node::{MappingNode, NodeKind};

/// Id of a pre-supplied node. The classification category has a single
/// target slot, so its target id carries no item suffix.
pub fn supplied_node_id(role: Role, category: Category, item_id: &str) -> String {
    if role == Role::Target && category == Category::Classification {
        return "target-classification".to_string();
    }
    format!("{}-{}-{}", role.prefix(), category.prefix(), item_id)
}

pub fn custom_node_id(role: Role, category: Category, stamp: u64) -> String {
    format!("custom-{}-{}-{}", role.prefix(), category.prefix(), stamp)
}

pub fn filter_node_id(stamp: u64) -> String {
    format!("filter-{stamp}")
}

pub fn region_node_id(category: Category) -> String {
    format!("region-{}", category.prefix())
}

/// Deterministic id of a mapping edge, derived from business identifiers.
pub fn mapping_edge_id(category: Category, source_id: &str, target_id: &str) -> String {
    format!("{}-{}-to-{}", category.prefix(), source_id, target_id)
}

/// Filter edges are keyed by their endpoint node ids; filters carry no
/// business identifiers of their own.
pub fn filter_edge_id(origin_node_id: &str, dest_node_id: &str) -> String {
    format!("{origin_node_id}-{dest_node_id}")
}

/// Recover the business identifier of a mapping node.
///
/// Custom nodes map to their label: the timestamp in their id is not a
/// meaningful identifier. Pre-supplied nodes strip the exact
/// `<role>-<category>-` prefix their kind implies. Filters and regions have
/// no business identifier.
pub fn business_id(node: &MappingNode) -> Option<String> {
    let (category, role) = match node.kind {
        NodeKind::Mapping { category, role } => (category, role),
        _ => return None,
    };
    if node.attrs.custom {
        return Some(node.label.clone());
    }
    if role == Role::Target && category == Category::Classification {
        return Some(CLASSIFICATION_TARGET_ID.to_string());
    }
    let prefix = format!("{}-{}-", role.prefix(), category.prefix());
    node.id
        .strip_prefix(&prefix)
        .map(str::to_string)
        // A node whose id does not follow the supplied shape falls back to
        // its label, which is the business identifier for simple categories.
        .or_else(|| Some(node.label.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;

    #[test]
    fn supplied_ids_embed_role_category_and_item() {
        assert_eq!(
            supplied_node_id(Role::Source, Category::PropertySet, "Custom_Pset_1"),
            "source-pset-Custom_Pset_1"
        );
        assert_eq!(
            supplied_node_id(Role::Target, Category::Quantity, "netLength"),
            "target-quantity-netLength"
        );
    }

    #[test]
    fn classification_target_has_single_canonical_id() {
        assert_eq!(
            supplied_node_id(Role::Target, Category::Classification, "anything"),
            "target-classification"
        );
    }

    #[test]
    fn business_id_strips_supplied_prefix() {
        let item = CatalogItem::new("Custom_Pset_1", "Custom_Pset_1");
        let node = MappingNode::supplied(Category::PropertySet, Role::Source, &item);
        assert_eq!(business_id(&node).as_deref(), Some("Custom_Pset_1"));
    }

    #[test]
    fn business_id_of_custom_node_is_its_label() {
        let node = MappingNode::custom(
            Role::Source,
            Category::PropertySet,
            "My_Pset".to_string(),
            None,
            1712000000000,
        );
        assert_eq!(node.id, "custom-source-pset-1712000000000");
        assert_eq!(business_id(&node).as_deref(), Some("My_Pset"));
    }

    #[test]
    fn business_id_of_classification_target_is_the_literal() {
        let item = CatalogItem::new("classification", "IFC Classification");
        let node = MappingNode::supplied(Category::Classification, Role::Target, &item);
        assert_eq!(business_id(&node).as_deref(), Some("classification"));
    }

    #[test]
    fn filters_and_regions_have_no_business_id() {
        assert_eq!(business_id(&MappingNode::class_filter("Filter".into(), 1)), None);
        assert_eq!(business_id(&MappingNode::region(Category::Property)), None);
    }

    #[test]
    fn mapping_edge_ids_are_deterministic() {
        assert_eq!(
            mapping_edge_id(Category::PropertySet, "Custom_Pset_1", "Pset_WallCommon"),
            "pset-Custom_Pset_1-to-Pset_WallCommon"
        );
        assert_eq!(
            mapping_edge_id(Category::Classification, "name", CLASSIFICATION_TARGET_ID),
            "classification-name-to-classification"
        );
    }
}
