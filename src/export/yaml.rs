//! YAML export, the same document as the JSON export in a readable form

use std::io::Write;

use crate::error::{DashboardError, DashboardResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> DashboardResult<()> {
    let export = FullExport::from_storage(storage)?;
    let io_err = |e: std::io::Error| DashboardError::Export(e.to_string());

    writeln!(writer, "# InOut Dashboard export").map_err(io_err)?;
    writeln!(writer, "# Generated: {}", export.export_info.exported_at).map_err(io_err)?;
    writeln!(writer, "# Contains your full financial history; store it safely.").map_err(io_err)?;
    writeln!(writer).map_err(io_err)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| DashboardError::Export(e.to_string()))
}

/// Parse and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> DashboardResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| DashboardError::Import(e.to_string()))?;
    export.validate().map_err(DashboardError::Import)?;
    Ok(export)
}
