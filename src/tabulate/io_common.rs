use std::path::{Path, PathBuf};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Paths in a configuration file are relative to the directory of that file.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    let p: PathBuf = [root, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}
