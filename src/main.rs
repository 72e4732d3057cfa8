//! OpenAPI Schema Resolver - Command-line tool for generating OpenAPI documentation.
//!
//! The binary reads declaration manifests produced by a language front end,
//! resolves every type they mention into OpenAPI schemas (including recursive
//! and generic types) and writes a complete OpenAPI 3 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-schema-resolver [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-schema-resolver ./decls -o openapi.yaml
//! ```
//!
//! Restrict indexing to one module and a dependency:
//! ```bash
//! openapi-schema-resolver ./decls -m example.com/shop -d example.com/common -f json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_schema_resolver::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can configure the logger
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI Schema Resolver starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
