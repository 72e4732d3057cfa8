use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffixes of declaration manifest files
const MANIFEST_SUFFIXES: &[&str] = &[".decl.json", ".decl.yaml", ".decl.yml"];

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find all declaration
/// manifests (`*.decl.json`, `*.decl.yaml`, `*.decl.yml`). It skips `target` and hidden
/// directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use openapi_schema_resolver::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} manifests", result.manifest_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths of all discovered manifests, sorted
    pub manifest_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all manifest files.
    ///
    /// Inaccessible entries are logged and reported in [`ScanResult::warnings`]; scanning
    /// continues past them. The result is sorted so the analysis is reproducible.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut manifest_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && is_manifest(path) {
                        manifest_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        manifest_files.sort();
        Ok(ScanResult {
            manifest_files,
            warnings,
        })
    }
}

/// Whether a path names a declaration manifest.
pub fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| {
            MANIFEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("model.decl.yaml"), "path: m").unwrap();
        fs::write(root.join("api.decl.json"), "{\"path\": \"a\"}").unwrap();
        fs::write(root.join("config.yaml"), "plugin: declared").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert!(result.warnings.is_empty());
        let file_names: Vec<String> = result
            .manifest_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            file_names,
            vec!["api.decl.json".to_string(), "model.decl.yaml".to_string()]
        );
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("internal/model")).unwrap();
        fs::write(root.join("internal/model/user.decl.yml"), "path: m").unwrap();
        fs::write(root.join("main.decl.yaml"), "path: main").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.manifest_files.len(), 2);
    }

    #[test]
    fn test_skip_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("target")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("target/build.decl.json"), "{}").unwrap();
        fs::write(root.join(".cache/old.decl.yaml"), "path: x").unwrap();
        fs::write(root.join("api.decl.yaml"), "path: a").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(result.manifest_files.len(), 1);
        assert!(result.manifest_files[0].ends_with("api.decl.yaml"));
    }

    #[test]
    fn test_is_manifest() {
        assert!(is_manifest(Path::new("a/b/user.decl.yaml")));
        assert!(is_manifest(Path::new("user.decl.json")));
        assert!(!is_manifest(Path::new("user.yaml")));
        assert!(!is_manifest(Path::new("decl.json")));
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();
        assert!(result.manifest_files.is_empty());
        assert!(result.warnings.is_empty());
    }
}
