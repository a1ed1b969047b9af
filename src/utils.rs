use ab_glyph::FontVec;
use glob::{glob, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// Bundled so labels render on hosts without system fonts
const EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const EMBEDDED_FONT_NAME: &str = "assets/DejaVuSans.ttf";

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create `path` (and its parents) unless it already exists. Existing content is kept.
pub fn ensure_directory(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Regular files directly inside `dir` whose name ends with one of `suffixes`, sorted by path.
///
/// Suffix matching is case-sensitive. A missing `dir` is an error.
pub fn list_files_with_suffixes(dir: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "directory not found"),
        ));
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let entries = glob(&pattern)
        .map_err(|e| Error::io(dir, io::Error::new(io::ErrorKind::InvalidInput, e.msg)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::io(path, io::Error::from(e))
        })?;
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load the font used for detection labels.
///
/// An explicit path must exist and parse; without one the bundled DejaVu Sans is used.
pub fn load_label_font(explicit: Option<&Path>) -> Result<FontVec> {
    let Some(path) = explicit else {
        return embedded_label_font();
    };
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let font = FontVec::try_from_vec(bytes).map_err(|_| Error::Font {
        path: path.to_path_buf(),
    })?;
    debug!("Using label font {}", path.display());
    Ok(font)
}

pub fn embedded_label_font() -> Result<FontVec> {
    FontVec::try_from_vec(EMBEDDED_FONT.to_vec()).map_err(|_| Error::Font {
        path: PathBuf::from(EMBEDDED_FONT_NAME),
    })
}

/// Shortest round-trip decimal text for `value`.
///
/// Integral values keep a trailing `.0`, and magnitudes below 1e-4 or from 1e16 upward use an
/// exponent with an explicit sign and at least two digits (`5e-05`, `1e+16`).
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{:e}", value);
        if let Some((mantissa, exponent)) = scientific.split_once('e') {
            if let Ok(exponent) = exponent.parse::<i32>() {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
            }
        }
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}
