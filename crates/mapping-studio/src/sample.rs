//! Built-in demo data so the editor opens with something to look at.

use crate::store::Store;
use mapping_model::{Catalog, CatalogItem, MappingConfig};

pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.set_property_sets(
        ["Custom_Pset_1", "Custom_Pset_2"],
        ["Pset_WallCommon", "Pset_SlabCommon"],
    );
    catalog.properties.sources = vec![
        CatalogItem::new("prop1", "prop1").with_detail("Custom_Pset_1"),
        CatalogItem::new("prop2", "prop2").with_detail("Custom_Pset_2"),
    ];
    catalog.properties.targets = vec![
        CatalogItem::new("tgt1", "tgt1"),
        CatalogItem::new("FireRating", "FireRating"),
    ];
    catalog.quantities.sources = vec![CatalogItem::new("length", "length").with_detail("m")];
    catalog.quantities.targets = vec![CatalogItem::new("netLength", "netLength").with_detail("m")];
    catalog.classifications.sources =
        vec![CatalogItem::new("name", "name").with_detail("Uniclass")];
    catalog.ifc_classes = vec![
        "IfcWall".into(),
        "IfcSlab".into(),
        "IfcDoor".into(),
        "IfcWindow".into(),
        "IfcBeam".into(),
    ];
    catalog
}

pub fn sample_config() -> MappingConfig {
    let mut config = MappingConfig::new();
    config.insert("Custom_Pset_1".into(), "Pset_WallCommon".into());
    config
}

/// A store seeded with the demo catalog, one configured property-set
/// mapping and a few pre-drawn connections.
pub fn sample_store() -> Store {
    let mut store = Store::new(sample_catalog(), sample_config());

    let pairs = [
        ("source-property-prop1", "target-property-tgt1"),
        ("source-quantity-length", "target-quantity-netLength"),
        ("source-classification-name", "target-classification"),
    ];
    for (origin, dest) in pairs {
        let (Some(o), Some(d)) = (store.index_of(origin), store.index_of(dest)) else {
            continue;
        };
        // Demo pairs are valid by construction.
        store.connect(o, d).ok();
    }

    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_store_has_the_demo_connections() {
        let store = sample_store();
        // One property-set edge from the config plus three drawn pairs.
        assert_eq!(store.graph.edges_iter().count(), 4);
        assert!(store.status_message.is_none());
    }
}
