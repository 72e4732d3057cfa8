//! OpenAPI Schema Resolver - OpenAPI documentation from type-resolved source declarations.
//!
//! A language front end parses and type-checks a web project and writes one
//! declaration manifest per source file. This library indexes those
//! declarations, turns every type an endpoint mentions into an OpenAPI schema
//! and assembles an OpenAPI 3 document. Recursive types are emitted as
//! references, enums are recovered from constant groups, comment annotations
//! (`@required`, `@deprecated`, `@tags` ...) are honoured, and generic types are
//! specialized into concrete named schemas such as `Page[model.User]`.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds declaration manifests in a directory tree
//! 2. [`loader`] - Deserializes manifests into the [`model`] types
//! 3. [`definition`] - Indexes declarations and links constant groups to enums
//! 4. [`extractor`] - Produces the route list from the manifests
//! 5. [`schema_builder`] - Resolves type expressions into [`schema`] nodes,
//!    using [`comment`], [`annotation`] and [`tag`] for field metadata
//! 6. [`specialize`] - Replaces generic applications with concrete schemas
//! 7. [`openapi_builder`] - Constructs the complete OpenAPI document
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_schema_resolver::{
//!     definition::{DeclarationIndex, IndexScope},
//!     extractor::{extractor_for, RouteExtractor},
//!     loader::ManifestLoader,
//!     openapi_builder::OpenApiBuilder,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./decls")).scan().unwrap();
//! let manifests: Vec<_> = ManifestLoader::load_files(&scan_result.manifest_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let index = DeclarationIndex::build(&manifests, &IndexScope::default());
//! let routes = extractor_for("declared").unwrap().extract_routes(&manifests);
//!
//! let mut builder = OpenApiBuilder::new(index);
//! for route in &routes {
//!     builder.add_route(route);
//! }
//! let document = builder.build();
//!
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotation;
pub mod cli;
pub mod comment;
pub mod config;
pub mod definition;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod model;
pub mod openapi_builder;
pub mod scanner;
pub mod schema;
pub mod schema_builder;
pub mod serializer;
pub mod specialize;
pub mod tag;
