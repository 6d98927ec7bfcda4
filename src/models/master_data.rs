//! 只读主数据：物料目录、物料-供应商映射、批次号

use std::collections::HashMap;

use serde::Deserialize;

/// 物料目录中的一行
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "Item Code")]
    pub item_code: String,
    #[serde(rename = "Item Name")]
    pub item_name: String,
    #[serde(rename = "Item Group", default)]
    pub item_group: String,
    #[serde(rename = "Valuation Rate")]
    pub valuation_rate: f64,
    #[serde(rename = "Default Unit of Measure")]
    pub uom: String,
    #[serde(rename = "Has Batch No", default, deserialize_with = "flag")]
    pub has_batch_no: bool,
    #[serde(rename = "Description", default)]
    pub description: String,
}

fn flag<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(raw.trim(), "1" | "true" | "True" | "yes"))
}

/// 主数据集合
#[derive(Debug, Clone, Default)]
pub struct MasterData {
    /// 可采购的物料（已按物料组过滤）
    components: Vec<CatalogItem>,
    catalog: HashMap<String, CatalogItem>,
    supplier_by_item: HashMap<String, String>,
    batch_by_item: HashMap<String, String>,
}

impl MasterData {
    /// `items` 为完整物料目录，`components` 从中按物料组筛出
    pub fn new(
        items: Vec<CatalogItem>,
        item_group: &str,
        supplier_by_item: HashMap<String, String>,
        batch_by_item: HashMap<String, String>,
    ) -> Self {
        let components = items
            .iter()
            .filter(|item| item.item_group == item_group)
            .cloned()
            .collect();
        let catalog = items
            .into_iter()
            .map(|item| (item.item_code.clone(), item))
            .collect();

        Self {
            components,
            catalog,
            supplier_by_item,
            batch_by_item,
        }
    }

    pub fn components(&self) -> &[CatalogItem] {
        &self.components
    }

    pub fn item(&self, item_code: &str) -> Option<&CatalogItem> {
        self.catalog.get(item_code)
    }

    pub fn supplier_for(&self, item_code: &str) -> Option<&str> {
        self.supplier_by_item.get(item_code).map(String::as_str)
    }

    pub fn batch_for(&self, item_code: &str) -> Option<&str> {
        self.batch_by_item.get(item_code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, group: &str, rate: f64) -> CatalogItem {
        CatalogItem {
            item_code: code.into(),
            item_name: format!("Item {}", code),
            item_group: group.into(),
            valuation_rate: rate,
            uom: "Stk".into(),
            has_batch_no: false,
            description: String::new(),
        }
    }

    #[test]
    fn components_are_filtered_by_group_but_catalog_keeps_all() {
        let data = MasterData::new(
            vec![
                item("BK-1", "Fahrradkomponenten", 10.0),
                item("FG-1", "Fahrräder", 900.0),
            ],
            "Fahrradkomponenten",
            HashMap::from([("BK-1".to_string(), "SUP-1".to_string())]),
            HashMap::new(),
        );

        assert_eq!(data.components().len(), 1);
        assert!(data.item("FG-1").is_some());
        assert_eq!(data.supplier_for("BK-1"), Some("SUP-1"));
        assert_eq!(data.supplier_for("FG-1"), None);
    }
}
