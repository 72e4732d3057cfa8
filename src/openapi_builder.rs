use crate::comment::Comment;
use crate::definition::DeclarationIndex;
use crate::error::Diagnostic;
use crate::extractor::{HttpMethod, Payload, RouteInfo};
use crate::model::TypeExpr;
use crate::schema::{Schema, SchemaTable};
use crate::schema_builder::SchemaBuilder;
use crate::specialize::Specializer;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// OpenAPI document builder
///
/// Owns everything an analysis session shares: the declaration index, the
/// schema table and the diagnostics collected while resolving.
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Declarations that named types and handlers are looked up in
    index: DeclarationIndex,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    /// Named schemas by model key
    schemas: SchemaTable,
    diagnostics: Vec<Diagnostic>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        [
            &mut self.get,
            &mut self.post,
            &mut self.put,
            &mut self.delete,
            &mut self.patch,
            &mut self.options,
            &mut self.head,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements: scheme name -> scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: SchemaTable,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new(index: DeclarationIndex) -> Self {
        debug!("Initializing OpenApiBuilder with {} declarations", index.len());
        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: Some("API documentation generated from source declarations".to_string()),
            },
            index,
            paths: BTreeMap::new(),
            schemas: SchemaTable::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    pub fn index(&self) -> &DeclarationIndex {
        &self.index
    }

    /// Problems found while resolving so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolve a type expression against the session's schema table.
    pub fn schema_for(&mut self, package: &str, ty: &TypeExpr, content_type: &str) -> Schema {
        SchemaBuilder::new(
            &self.index,
            &mut self.schemas,
            &mut self.diagnostics,
            package,
            content_type,
        )
        .resolve(ty)
    }

    /// Add a route to the OpenAPI document
    pub fn add_route(&mut self, route: &RouteInfo) {
        debug!("Adding route: {} {}", route.method_str(), route.path);

        let comment = match self.index.lookup_function(&route.handler) {
            Some(handler) => handler.comment(),
            None => {
                debug!("Handler {} is not indexed, no annotations", route.handler);
                Comment::default()
            }
        };

        // Convert path parameters from :param to {param} format
        let openapi_path = Self::convert_path_format(&route.path);

        let parameters = if route.parameters.is_empty() {
            None
        } else {
            let params: Vec<Parameter> = route
                .parameters
                .iter()
                .map(|p| {
                    let mut schema = self.schema_for(&route.package, &p.type_expr, DEFAULT_CONTENT_TYPE);
                    // Parameters are plain values; comment-level flags do not apply
                    schema.description = None;
                    Parameter {
                        name: p.name.clone(),
                        location: p.location.as_str().to_string(),
                        required: p.required,
                        schema,
                        description: p.description.clone(),
                    }
                })
                .collect();
            Some(params)
        };

        let consumes = comment.consumes();
        let request_body = route.request_body.as_ref().map(|payload| {
            let content_type = content_type_for(payload, consumes.first());
            let schema = self.schema_for(&route.package, &payload.type_expr, &content_type);
            RequestBody {
                description: Some("Request body".to_string()),
                required: true,
                content: BTreeMap::from([(content_type, MediaType { schema })]),
            }
        });

        let produces = comment.produces();
        let mut responses = BTreeMap::new();
        for response in &route.responses {
            let content = response.body.as_ref().map(|payload| {
                let content_type = content_type_for(payload, produces.first());
                let schema = self.schema_for(&route.package, &payload.type_expr, &content_type);
                BTreeMap::from([(content_type, MediaType { schema })])
            });
            responses.insert(
                response.status.to_string(),
                Response {
                    description: response
                        .description
                        .clone()
                        .unwrap_or_else(|| default_description(response.status)),
                    content,
                },
            );
        }
        if responses.is_empty() {
            // Default response when nothing is declared
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    content: None,
                },
            );
        }

        let short_name = route
            .handler_name()
            .rsplit('.')
            .next()
            .unwrap_or(route.handler_name());
        let description = comment.trim_prefix(short_name);
        let summary = comment
            .summary()
            .map(str::to_string)
            .or_else(|| description.lines().next().map(str::to_string))
            .unwrap_or_else(|| format!("{} {}", route.method_str(), route.path));

        let operation = Operation {
            tags: comment.tags(),
            summary: Some(summary),
            description: if description.is_empty() {
                None
            } else {
                Some(description)
            },
            operation_id: Some(
                comment
                    .id()
                    .map(str::to_string)
                    .unwrap_or_else(|| short_name.to_string()),
            ),
            parameters,
            request_body,
            responses,
            deprecated: comment.deprecated(),
            security: comment
                .security()
                .into_iter()
                .map(|(name, scopes)| BTreeMap::from([(name, scopes)]))
                .collect(),
        };

        // Add operation to the appropriate path and method
        let path_item = self.paths.entry(openapi_path).or_default();

        match route.method {
            HttpMethod::Get => path_item.get = Some(operation),
            HttpMethod::Post => path_item.post = Some(operation),
            HttpMethod::Put => path_item.put = Some(operation),
            HttpMethod::Delete => path_item.delete = Some(operation),
            HttpMethod::Patch => path_item.patch = Some(operation),
            HttpMethod::Options => path_item.options = Some(operation),
            HttpMethod::Head => path_item.head = Some(operation),
        }
    }

    /// Convert path format from :param, *param or {param} to OpenAPI {param} format
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':').or_else(|| part.strip_prefix('*')) {
                Some(name) if !name.is_empty() => format!("{{{}}}", name),
                _ => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Specialize every generic schema and build the final OpenAPI document
    pub fn build(mut self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let mut specializer = Specializer::new(&mut self.schemas, &mut self.diagnostics);
        specializer.specialize_table();
        for path_item in self.paths.values_mut() {
            for operation in path_item.operations_mut() {
                specialize_operation(&mut specializer, operation);
            }
        }

        for diagnostic in &self.diagnostics {
            warn!("{}", diagnostic);
        }

        let components = if self.schemas.is_empty() {
            None
        } else {
            Some(Components {
                schemas: self.schemas,
            })
        };

        OpenApiDocument {
            openapi: "3.0.3".to_string(),
            info: self.info,
            paths: self.paths,
            components,
        }
    }
}

fn specialize_operation(specializer: &mut Specializer, operation: &mut Operation) {
    let mut specialize = |schema: &mut Schema| {
        *schema = specializer.specialize(std::mem::take(schema));
    };

    for parameter in operation.parameters.iter_mut().flatten() {
        specialize(&mut parameter.schema);
    }
    if let Some(request_body) = &mut operation.request_body {
        for media in request_body.content.values_mut() {
            specialize(&mut media.schema);
        }
    }
    for response in operation.responses.values_mut() {
        for media in response.content.iter_mut().flat_map(|c| c.values_mut()) {
            specialize(&mut media.schema);
        }
    }
}

fn content_type_for(payload: &Payload, annotated: Option<&String>) -> String {
    payload
        .content_type
        .clone()
        .or_else(|| annotated.cloned())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

fn default_description(status: u16) -> String {
    match status {
        200..=299 => "Successful response".to_string(),
        _ => "Error response".to_string(),
    }
}

impl RouteInfo {
    /// Get the HTTP method as a string
    fn method_str(&self) -> &str {
        match self.method {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}
