use crate::category::Category;
use serde::{Deserialize, Serialize};

/// One entry of a source or target identifier list. For simple categories
/// (property sets) the id doubles as the display label; richer categories
/// carry a separate label plus a category-specific detail (originating
/// property set, unit, or classification sub-type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub label: String,
    pub detail: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// An item whose id is its label, e.g. a property-set name.
    pub fn simple(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            label: name,
            detail: None,
        }
    }
}

/// Ordered source and target identifier lists for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryItems {
    pub sources: Vec<CatalogItem>,
    pub targets: Vec<CatalogItem>,
}

/// Everything the layout engine and synchronizer consume: per-category
/// identifier lists plus the entity classes offered to filter nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub property_sets: CategoryItems,
    pub properties: CategoryItems,
    pub quantities: CategoryItems,
    pub classifications: CategoryItems,
    pub ifc_classes: Vec<String>,
}

impl Catalog {
    pub fn items(&self, category: Category) -> &CategoryItems {
        match category {
            Category::PropertySet => &self.property_sets,
            Category::Property => &self.properties,
            Category::Quantity => &self.quantities,
            Category::Classification => &self.classifications,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut CategoryItems {
        match category {
            Category::PropertySet => &mut self.property_sets,
            Category::Property => &mut self.properties,
            Category::Quantity => &mut self.quantities,
            Category::Classification => &mut self.classifications,
        }
    }

    /// Replace the property-set lists from plain name lists, the shape the
    /// transformation engine reports them in.
    pub fn set_property_sets<S: Into<String>>(
        &mut self,
        sources: impl IntoIterator<Item = S>,
        targets: impl IntoIterator<Item = S>,
    ) {
        self.property_sets.sources = sources.into_iter().map(CatalogItem::simple).collect();
        self.property_sets.targets = targets.into_iter().map(CatalogItem::simple).collect();
    }
}
