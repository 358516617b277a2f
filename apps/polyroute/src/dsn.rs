//! sqlite DSN resolution and data-directory bookkeeping (§4.11, §10.5).

use std::fs::OpenOptions;
use std::path::PathBuf;

pub fn resolve_data_dir(cli_value: &str) -> String {
    if !cli_value.trim().is_empty() {
        return cli_value.to_string();
    }
    if let Ok(value) = std::env::var("POLYROUTE_DATA_DIR")
        && !value.trim().is_empty()
    {
        return value;
    }
    "./data".to_string()
}

pub fn resolve_dsn(input: Option<&str>, data_dir: &str) -> anyhow::Result<String> {
    if let Some(input) = input.filter(|s| !s.trim().is_empty()) {
        ensure_sqlite_dsn(input)?;
        return Ok(input.to_string());
    }

    let db_path = PathBuf::from(data_dir).join("polyroute.db");
    let db_path = db_path.to_string_lossy();
    let dsn = if db_path.starts_with('/') {
        format!("sqlite://{}?mode=rwc", db_path)
    } else {
        format!("sqlite://{}?mode=rwc", db_path)
    };
    ensure_sqlite_dsn(&dsn)?;
    Ok(dsn)
}

fn ensure_sqlite_dsn(dsn: &str) -> anyhow::Result<()> {
    let Some(rest) = dsn.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    if rest.is_empty() || rest.starts_with(":memory:") || rest.starts_with("memory:") {
        return Ok(());
    }

    let path_part = rest.split(['?', '#']).next().unwrap_or("");
    if path_part.is_empty() {
        return Ok(());
    }

    let path = PathBuf::from(path_part);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        OpenOptions::new().create(true).write(true).truncate(false).open(&path)?;
    }
    Ok(())
}
