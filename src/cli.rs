use crate::config::{Config, DEFAULT_CONFIG_FILE};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI Schema Resolver - Generate OpenAPI documentation from type-resolved source declarations
#[derive(Parser, Debug)]
#[command(name = "openapi-schema-resolver")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the directory holding the declaration manifests
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Configuration file (defaults to <PROJECT_PATH>/eapi.yaml when present)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Route extractor to use
    #[arg(short = 'p', long = "plugin", value_name = "NAME")]
    pub plugin: Option<String>,

    /// Entry module path; only packages below it are indexed
    #[arg(short = 'm', long = "module", value_name = "PATH")]
    pub module: Option<String>,

    /// Additional package path prefixes to index
    #[arg(short = 'd', long = "depends", value_name = "PATH", num_args = 1..)]
    pub depends: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

const DEFAULT_PLUGIN: &str = "declared";

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if let Some(ref config) = args.config_path {
        if !config.is_file() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    }

    Ok(args)
}

/// Load the configuration file, if any, and overlay the command-line flags.
pub fn resolve_config(args: &CliArgs) -> Result<Config> {
    let path = match &args.config_path {
        Some(path) => Some(path.clone()),
        None => {
            let default = args.project_path.join(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    };

    let config = match path {
        Some(path) => {
            info!("Using config file: {}", path.display());
            Config::load(&path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?
        }
        None => Config::default(),
    };

    Ok(config.merge(
        args.plugin.clone(),
        args.module.clone(),
        args.depends.clone(),
        args.output_path.clone(),
    ))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::definition::DeclarationIndex;
    use crate::extractor::{extractor_for, extractor_names, RouteExtractor};
    use crate::loader::ManifestLoader;
    use crate::model::PackageManifest;
    use crate::openapi_builder::OpenApiBuilder;
    use crate::scanner::FileScanner;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

    info!("Starting OpenAPI document generation...");
    let config = resolve_config(&args)?;
    debug!("Effective configuration: {:?}", config);

    let plugin = config.plugin.as_deref().unwrap_or(DEFAULT_PLUGIN);
    let extractor = match extractor_for(plugin) {
        Some(extractor) => extractor,
        None => anyhow::bail!(
            "Unknown plugin: {}. Available plugins: {}",
            plugin,
            extractor_names().join(", ")
        ),
    };

    // Step 1: Scan directory for manifests
    info!("Scanning project directory...");
    let scanner = FileScanner::new(args.project_path.clone());
    let scan_result = scanner.scan()?;

    info!("Found {} manifest files", scan_result.manifest_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }

    if scan_result.manifest_files.is_empty() {
        anyhow::bail!("No declaration manifests found in the project directory");
    }

    // Step 2: Load manifests
    info!("Loading manifests...");
    let manifests: Vec<PackageManifest> = ManifestLoader::load_files(&scan_result.manifest_files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!("Skipping manifest due to error: {}", e);
                None
            }
        })
        .collect();

    info!("Successfully loaded {} manifests", manifests.len());

    if manifests.is_empty() {
        anyhow::bail!("No manifests could be loaded successfully");
    }

    // Step 3: Index declarations
    info!("Indexing declarations...");
    let index = DeclarationIndex::build(&manifests, &config.index_scope());
    info!("Indexed {} declarations", index.len());

    // Step 4: Extract routes
    info!("Extracting routes with the {} plugin...", extractor.name());
    let routes = extractor.extract_routes(&manifests);
    info!("Extracted {} routes", routes.len());

    if routes.is_empty() {
        warn!("No routes found in the project");
    }

    // Step 5: Build OpenAPI document
    info!("Building OpenAPI document...");
    let mut builder = OpenApiBuilder::new(index);
    if config.openapi.title.is_some() || config.openapi.version.is_some() {
        builder = builder.with_info(
            config
                .openapi
                .title
                .clone()
                .unwrap_or_else(|| "Generated API".to_string()),
            config
                .openapi
                .version
                .clone()
                .unwrap_or_else(|| "1.0.0".to_string()),
            config.openapi.description.clone(),
        );
    }

    for route in &routes {
        builder.add_route(route);
    }

    let diagnostics = builder.diagnostics().len();
    let document = builder.build();
    let schemas = document
        .components
        .as_ref()
        .map_or(0, |components| components.schemas.len());
    info!("OpenAPI document built successfully");

    // Step 6: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 7: Output to file or stdout
    if let Some(output_path) = &config.output {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Manifests scanned: {}", scan_result.manifest_files.len());
    info!("  - Manifests loaded: {}", manifests.len());
    info!("  - Routes found: {}", routes.len());
    info!("  - Schemas: {}", schemas);
    if diagnostics > 0 {
        warn!("  - Unresolved types: {} (see warnings above)", diagnostics);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(project: &std::path::Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["openapi-schema-resolver".to_string()];
        argv.push(project.display().to_string());
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from([
            "openapi-schema-resolver",
            "./project",
            "-f",
            "json",
            "-p",
            "declared",
            "-m",
            "example.com/shop",
            "-d",
            "example.com/a",
            "example.com/b",
            "-v",
        ])
        .unwrap();

        assert!(matches!(args.output_format, OutputFormat::Json));
        assert_eq!(args.plugin.as_deref(), Some("declared"));
        assert_eq!(args.module.as_deref(), Some("example.com/shop"));
        assert_eq!(args.depends, vec!["example.com/a", "example.com/b"]);
        assert!(args.verbose);
    }

    #[test]
    fn test_missing_project_path_is_rejected() {
        let args = CliArgs::try_parse_from(["openapi-schema-resolver", "/nonexistent/project"])
            .unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_default_config_file_is_picked_up() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "module: example.com/shop\ndepends: [example.com/common]\n",
        )
        .unwrap();

        let args = args_for(temp_dir.path(), &["-d", "example.com/extra"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.module.as_deref(), Some("example.com/shop"));
        assert_eq!(config.depends, vec!["example.com/common", "example.com/extra"]);
    }

    #[test]
    fn test_cli_module_overrides_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "module: example.com/shop\n",
        )
        .unwrap();

        let args = args_for(temp_dir.path(), &["-m", "example.com/other"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.module.as_deref(), Some("example.com/other"));
    }

    #[test]
    fn test_run_fails_without_manifests() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &[]);
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("No declaration manifests"));
    }

    #[test]
    fn test_run_fails_with_unknown_plugin() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &["-p", "gin"]);
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("Unknown plugin: gin"));
    }

    #[test]
    fn test_run_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("api.decl.yaml"),
            r#"
path: example.com/shop/api
routes:
  - { method: GET, path: /ping, handler: Ping }
"#,
        )
        .unwrap();
        let output = temp_dir.path().join("out").join("openapi.json");

        let args = args_for(
            temp_dir.path(),
            &["-f", "json", "-o", output.to_str().unwrap()],
        );
        run(args).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(parsed["paths"]["/ping"]["get"].is_object());
    }
}
