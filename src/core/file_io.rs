use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::error::{NumericsError, NumericsResult};

pub fn extract_base_name(path: &str) -> NumericsResult<&str> {
    Path::new(path)
        .file_stem() // Get the base name component of the path
        .and_then(|name| name.to_str())
        .ok_or_else(|| NumericsError::invalid_argument(format!("no file name in `{path}`")))
}

/// `out/<scenario>/<params base name>[/<datetime>]`, created if missing.
pub fn build_output_path_with_date_time(
    params_path: &str,
    scenario: &str,
    datetime: &Option<String>,
) -> NumericsResult<PathBuf> {
    let mut dirs = vec!["out", scenario, extract_base_name(params_path)?];
    if let Some(inner_datetime_str) = datetime {
        dirs.push(inner_datetime_str);
    }

    let directory_path: PathBuf = dirs.iter().collect();
    std::fs::create_dir_all(&directory_path)?;
    Ok(directory_path)
}

pub fn date_time_string() -> String {
    use chrono::{Datelike, Local, Timelike};
    let local_time = Local::now();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        local_time.year(),
        local_time.month(),
        local_time.day(),
        local_time.hour(),
        local_time.minute(),
        local_time.second()
    )
}

pub fn maybe_date_time_string(enable: bool) -> Option<String> {
    if enable {
        Some(date_time_string())
    } else {
        None
    }
}

/**
 * Store a path and prefix together, making it easily to quickly generate
 * a collection of files with the same prefix, but separate suffixes.
 */
#[derive(Debug, Clone)]
pub struct FilePrefix {
    pub directory_path: PathBuf,
    pub file_base: String,
}

impl FilePrefix {
    pub fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.directory_path.join(self.file_base.clone() + suffix)
    }

    pub fn create_file_with_suffix(&self, suffix: &str) -> NumericsResult<BufWriter<File>> {
        let file = File::create(self.with_suffix(suffix))?;
        Ok(BufWriter::new(file))
    }

    /// Pretty-printed JSON of `value`, written to `<base><suffix>`.
    pub fn write_json<T: Serialize>(&self, suffix: &str, value: &T) -> NumericsResult<PathBuf> {
        let path = self.with_suffix(suffix);
        let mut writer = self.create_file_with_suffix(suffix)?;
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }
}
