pub mod batch;
pub mod document;
pub mod loaders;
pub mod master_data;
pub mod payload;
pub mod report;
pub mod stage;

pub use batch::{BatchRun, MonthlyAllocation, YearMonth};
pub use document::{round2, DocumentStatus, LineItem, StageDetails, StageDocument, StageResult, TaxLine};
pub use loaders::load_master_data;
pub use master_data::{CatalogItem, MasterData};
pub use report::{MonthOutcome, RunSummary, StageReport};
pub use stage::StageType;
