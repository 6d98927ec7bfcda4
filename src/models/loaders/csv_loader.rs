use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::master_data::{CatalogItem, MasterData};

const ITEMS_FILE: &str = "base/items.csv";
const SUPPLIER_MAPPING_FILE: &str = "mappings/item_supplier_mapping.csv";
const BATCH_NUMBERS_FILE: &str = "base/batch_numbers.csv";

#[derive(Debug, Deserialize)]
struct SupplierMappingRow {
    #[serde(rename = "Item Code")]
    item_code: String,
    #[serde(rename = "Supplier ID")]
    supplier_id: String,
}

#[derive(Debug, Deserialize)]
struct BatchNumberRow {
    #[serde(rename = "Item")]
    item: String,
    #[serde(rename = "Batch ID")]
    batch_id: String,
}

/// 从主数据目录加载物料目录、供应商映射与批次号
///
/// 物料目录与供应商映射缺失时返回配置错误，批次号文件可选。
pub fn load_master_data(master_data_dir: &Path, item_group: &str) -> AppResult<MasterData> {
    let items: Vec<CatalogItem> = read_rows(&master_data_dir.join(ITEMS_FILE))?;
    tracing::info!("成功加载 {} 个物料", items.len());

    let mappings: Vec<SupplierMappingRow> =
        read_rows(&master_data_dir.join(SUPPLIER_MAPPING_FILE))?;
    let supplier_by_item: HashMap<String, String> = mappings
        .into_iter()
        .map(|row| (row.item_code, row.supplier_id))
        .collect();
    tracing::info!("成功加载 {} 条物料-供应商映射", supplier_by_item.len());

    let batch_path = master_data_dir.join(BATCH_NUMBERS_FILE);
    let batch_by_item: HashMap<String, String> = if batch_path.exists() {
        read_rows::<BatchNumberRow>(&batch_path)?
            .into_iter()
            .map(|row| (row.item, row.batch_id))
            .collect()
    } else {
        tracing::warn!("批次号文件不存在，跳过: {}", batch_path.display());
        HashMap::new()
    };

    let data = MasterData::new(items, item_group, supplier_by_item, batch_by_item);
    if data.components().is_empty() {
        return Err(ConfigError::NoComponents {
            item_group: item_group.to_string(),
        }
        .into());
    }

    Ok(data)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    if !path.exists() {
        return Err(AppError::master_data_file_missing(path.display().to_string()));
    }

    let parse_failed = |source: csv::Error| ConfigError::MasterDataParseFailed {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_failed)?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result.map_err(parse_failed)?);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_catalog_mapping_and_batches() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ITEMS_FILE,
            "Item Code,Item Name,Item Group,Valuation Rate,Default Unit of Measure,Has Batch No,Description\n\
             BK-1,Kette,Fahrradkomponenten,12.50,Stk,1,Kette 8-fach\n\
             FG-1,Stadtrad,Fahrräder,899.00,Stk,0,\n",
        );
        write(
            dir.path(),
            SUPPLIER_MAPPING_FILE,
            "Item Code,Supplier ID\nBK-1,SUP-0001\n",
        );
        write(dir.path(), BATCH_NUMBERS_FILE, "Item,Batch ID\nBK-1,B-2023-01\n");

        let data = load_master_data(dir.path(), "Fahrradkomponenten").unwrap();
        assert_eq!(data.components().len(), 1);
        let chain = data.item("BK-1").unwrap();
        assert!(chain.has_batch_no);
        assert_eq!(chain.valuation_rate, 12.5);
        assert_eq!(data.supplier_for("BK-1"), Some("SUP-0001"));
        assert_eq!(data.batch_for("BK-1"), Some("B-2023-01"));
    }

    #[test]
    fn missing_mapping_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ITEMS_FILE,
            "Item Code,Item Name,Item Group,Valuation Rate,Default Unit of Measure\n\
             BK-1,Kette,Fahrradkomponenten,12.50,Stk\n",
        );

        let err = load_master_data(dir.path(), "Fahrradkomponenten").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::MasterDataFileMissing { .. })
        ));
    }
}
