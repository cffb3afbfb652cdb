use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::model::RunOutput;

/// Write `output` as indented JSON, replacing whatever was at `path`.
///
/// Missing parent directories are created first.
pub fn write_output(path: &Path, output: &RunOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(output).context("Failed to serialize output to JSON")?;

    fs::write(path, json)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;

    Ok(())
}
