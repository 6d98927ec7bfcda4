pub mod checkpoint;
pub mod ledger;
pub mod volume_distributor;

pub use checkpoint::{CheckpointStore, RunManifest};
pub use ledger::ResultLedger;
pub use volume_distributor::distribute;
