use crate::error::{Error, Result};
use crate::model::PackageManifest;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Loader for declaration manifests.
///
/// JSON files (`.json`) are read with `serde_json`, everything else with
/// `serde_yaml`.
///
/// # Example
///
/// ```no_run
/// use openapi_schema_resolver::loader::ManifestLoader;
/// use std::path::Path;
///
/// let manifest = ManifestLoader::load_file(Path::new("model.decl.yaml")).unwrap();
/// println!("Loaded {} types", manifest.types.len());
/// ```
pub struct ManifestLoader;

impl ManifestLoader {
    /// Loads a single manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn load_file(path: &Path) -> Result<PackageManifest> {
        debug!("Loading manifest: {}", path.display());

        let content = fs::read_to_string(path)?;
        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");

        let manifest: PackageManifest = if is_json {
            serde_json::from_str(&content).map_err(|e| Error::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        if manifest.path.is_empty() {
            return Err(Error::ParseError {
                file: path.to_path_buf(),
                message: "manifest has an empty package path".to_string(),
            });
        }

        debug!(
            "Loaded {}: {} types, {} const groups, {} funcs, {} routes",
            path.display(),
            manifest.types.len(),
            manifest.consts.len(),
            manifest.funcs.len(),
            manifest.routes.len()
        );
        Ok(manifest)
    }

    /// Loads multiple manifests, continuing even if some fail.
    ///
    /// Returns one result per input path; failures are logged as warnings so
    /// the remaining manifests can still be analyzed.
    pub fn load_files(paths: &[PathBuf]) -> Vec<Result<PackageManifest>> {
        debug!("Loading {} manifests", paths.len());

        let results: Vec<Result<PackageManifest>> = paths
            .iter()
            .map(|path| {
                let result = Self::load_file(path);
                if let Err(e) = &result {
                    warn!("Failed to load {}: {}", path.display(), e);
                }
                result
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Loading complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}
