use std::path::{Path, PathBuf};

/// Expand a leading `~` (home) or `~+` (working directory) and resolve
/// relative paths against `cwd`.
pub fn expand_path(value: &str, cwd: &Path) -> PathBuf {
    let expanded = if value == "~+" {
        cwd.to_path_buf()
    } else if let Some(rest) = value.strip_prefix("~+/") {
        cwd.join(rest)
    } else if value == "~" {
        home(cwd)
    } else if let Some(rest) = value.strip_prefix("~/") {
        home(cwd).join(rest)
    } else {
        PathBuf::from(value)
    };

    if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    }
}

fn home(cwd: &Path) -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| cwd.to_path_buf())
}
