//! Concrete adapter implementations for ports, plus text presentation.

#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod text_report;
