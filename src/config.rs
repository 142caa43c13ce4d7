use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DB_FILE_NAME: &str = "budgetbook.db";
const DB_FLAG: &str = "--db";

/// Remove a global `--db <path>` from `args`, returning the path if given.
/// The flag may appear anywhere after the program name.
pub(crate) fn take_db_flag(args: &mut Vec<String>) -> Result<Option<PathBuf>> {
    let Some(pos) = args.iter().position(|a| a == DB_FLAG) else {
        return Ok(None);
    };
    let Some(value) = args.get(pos + 1).cloned() else {
        anyhow::bail!("Usage: {DB_FLAG} <path>");
    };
    args.drain(pos..=pos + 1);
    Ok(Some(PathBuf::from(crate::run::shellexpand(&value))))
}

/// Database location: the `--db` override when present, otherwise
/// `budgetbook.db` in the platform data directory (created if missing).
pub(crate) fn get_db_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        return Ok(path);
    }

    let proj_dirs = directories::ProjectDirs::from("com", "budgetbook", "BudgetBook")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
