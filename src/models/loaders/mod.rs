pub mod csv_loader;

pub use csv_loader::load_master_data;
