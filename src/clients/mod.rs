pub mod document_client;
pub mod erp_client;

pub use document_client::{CreateRequest, CreatedDocument, DocumentService};
pub use erp_client::ErpClient;
