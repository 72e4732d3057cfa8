//! Route extraction module.
//!
//! Locating routes in source code is framework specific and happens before
//! the resolver sees anything. This module provides the seam: a route
//! extractor turns the loaded manifests into a list of [`RouteInfo`] values,
//! each naming its handler and the type expressions of its parameters, request
//! body and responses.
//!
//! # Supported Extractors
//!
//! - **declared**: routes written into the manifests by the front end. See
//!   [`declared::DeclaredExtractor`]
//!
//! # Example
//!
//! ```no_run
//! use openapi_schema_resolver::extractor::{extractor_for, RouteExtractor};
//! use openapi_schema_resolver::loader::ManifestLoader;
//! use std::path::Path;
//!
//! let manifest = ManifestLoader::load_file(Path::new("api.decl.yaml")).unwrap();
//! let extractor = extractor_for("declared").unwrap();
//! let routes = extractor.extract_routes(&[manifest]);
//! println!("Found {} routes", routes.len());
//! ```

pub mod declared;

use crate::model::{PackageManifest, TypeExpr};

pub use crate::model::ParameterLocation;

/// Trait for extracting route information from loaded manifests.
pub trait RouteExtractor {
    /// Name used to select the extractor (`--plugin`)
    fn name(&self) -> &'static str;

    /// Extracts all route information from the manifests, across all packages.
    fn extract_routes(&self, manifests: &[PackageManifest]) -> Vec<RouteInfo>;
}

/// Look up a route extractor by name.
pub fn extractor_for(name: &str) -> Option<Box<dyn RouteExtractor>> {
    match name {
        "declared" => Some(Box::new(declared::DeclaredExtractor)),
        _ => None,
    }
}

/// Names of all available extractors
pub fn extractor_names() -> &'static [&'static str] {
    &["declared"]
}

/// Complete information about a single API endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// The URL path pattern (e.g., "/users/:id" or "/users/{id}")
    pub path: String,
    /// The HTTP method for this route
    pub method: HttpMethod,
    /// Declaration key of the handler function (e.g. `example.com/shop/api.ListUsers`)
    pub handler: String,
    /// Package the handler lives in; package-less type references are relative to it
    pub package: String,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<Payload>,
    pub responses: Vec<ResponseInfo>,
}

impl RouteInfo {
    /// Create a new RouteInfo with minimal required fields
    pub fn new(path: &str, method: HttpMethod, package: &str, handler: &str) -> Self {
        Self {
            path: path.to_string(),
            method,
            handler: format!("{}.{}", package, handler),
            package: package.to_string(),
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
        }
    }

    /// Short handler name without its package
    pub fn handler_name(&self) -> &str {
        self.handler
            .strip_prefix(&self.package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.handler)
    }
}

/// HTTP methods supported by route extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Parse a method name, case-insensitively.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }
}

/// Information about a single parameter of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Where the parameter is extracted from (path, query, header)
    pub location: ParameterLocation,
    pub type_expr: TypeExpr,
    pub required: bool,
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: &str, location: ParameterLocation, type_expr: TypeExpr, required: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            type_expr,
            required,
            description: None,
        }
    }
}

/// A request or response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub type_expr: TypeExpr,
    /// Overrides the content type derived from the handler's annotations
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    pub status: u16,
    pub body: Option<Payload>,
    pub description: Option<String>,
}
