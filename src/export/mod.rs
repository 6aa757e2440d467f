//! Workspace exports
//!
//! - JSON: the full workspace with an `export_info` header
//! - YAML: the same document, human readable
//! - CSV: the transaction ledger for spreadsheets
//!
//! Files land in `<workspace>/exports/`.

pub mod csv;
pub mod json;
pub mod yaml;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::error::{DashboardError, DashboardResult};
use crate::storage::Storage;

pub use self::csv::export_transactions_csv;
pub use json::{export_full_json, import_from_json, ExportInfo, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, import_from_yaml};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    TransactionsCsv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::TransactionsCsv => "csv",
        }
    }

    fn stem(&self) -> &'static str {
        match self {
            Self::TransactionsCsv => "transactions",
            _ => "export",
        }
    }
}

/// Write an export into the workspace export directory and return its path
pub fn export_to_file(storage: &Storage, format: ExportFormat) -> DashboardResult<PathBuf> {
    let dir = storage.paths().export_dir();
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!(
        "{}-{}.{}",
        format.stem(),
        Utc::now().format("%Y%m%d-%H%M%S"),
        format.extension()
    ));
    let file = File::create(&path)
        .map_err(|e| DashboardError::Export(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Json => export_full_json(storage, &mut writer, true)?,
        ExportFormat::Yaml => export_full_yaml(storage, &mut writer)?,
        ExportFormat::TransactionsCsv => {
            export_transactions_csv(storage, &mut writer)?;
        }
    }

    std::io::Write::flush(&mut writer).map_err(|e| DashboardError::Export(e.to_string()))?;
    info!(path = %path.display(), format = format.extension(), "wrote export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::WorkspacePaths;
    use tempfile::TempDir;

    #[test]
    fn test_export_to_file_names() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WorkspacePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        for format in [ExportFormat::Json, ExportFormat::Yaml, ExportFormat::TransactionsCsv] {
            let path = export_to_file(&storage, format).unwrap();
            assert!(path.starts_with(temp_dir.path().join("exports")));
            assert_eq!(path.extension().unwrap(), format.extension());
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
