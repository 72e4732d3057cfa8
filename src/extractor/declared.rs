use crate::extractor::{
    HttpMethod, Parameter, ParameterLocation, Payload, ResponseInfo, RouteExtractor, RouteInfo,
};
use crate::model::{PackageManifest, RouteSpec, TypeExpr};
use log::{debug, warn};

/// Extractor for routes that a front end recorded in the manifests
pub struct DeclaredExtractor;

impl RouteExtractor for DeclaredExtractor {
    fn name(&self) -> &'static str {
        "declared"
    }

    fn extract_routes(&self, manifests: &[PackageManifest]) -> Vec<RouteInfo> {
        let mut routes = Vec::new();

        for manifest in manifests {
            for spec in &manifest.routes {
                match convert_route(&manifest.path, spec) {
                    Some(route) => {
                        debug!(
                            "Found route {:?} {} -> {}",
                            route.method, route.path, route.handler
                        );
                        routes.push(route);
                    }
                    None => warn!(
                        "Skipping route {} {} with unsupported method",
                        spec.method, spec.path
                    ),
                }
            }
        }

        routes
    }
}

fn convert_route(manifest_package: &str, spec: &RouteSpec) -> Option<RouteInfo> {
    let method = HttpMethod::parse(&spec.method)?;
    let package = spec.package.as_deref().unwrap_or(manifest_package);
    let mut route = RouteInfo::new(&spec.path, method, package, &spec.handler);

    for param in &spec.params {
        let mut parameter = Parameter::new(
            &param.name,
            param.location,
            param.ty.clone(),
            // Path parameters are always required
            param.required || param.location == ParameterLocation::Path,
        );
        parameter.description = param.description.clone();
        route.parameters.push(parameter);
    }

    for name in path_params(&spec.path) {
        let declared = route
            .parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Path && p.name == name);
        if !declared {
            route.parameters.push(Parameter::new(
                &name,
                ParameterLocation::Path,
                TypeExpr::basic("string"),
                true,
            ));
        }
    }

    route.request_body = spec.request.as_ref().map(|request| Payload {
        type_expr: request.ty.clone(),
        content_type: request.content_type.clone(),
    });

    route.responses = spec
        .responses
        .iter()
        .map(|response| ResponseInfo {
            status: response.status,
            body: response.ty.as_ref().map(|ty| Payload {
                type_expr: ty.clone(),
                content_type: response.content_type.clone(),
            }),
            description: response.description.clone(),
        })
        .collect();

    Some(route)
}

/// Parameter names in a path pattern: `:id`, `*rest` and `{id}` segments.
pub fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                Some(name)
            } else if let Some(name) = segment.strip_prefix('*') {
                Some(name)
            } else {
                segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
            }
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(yaml: &str) -> Vec<RouteInfo> {
        let manifest: PackageManifest = serde_yaml::from_str(yaml).unwrap();
        DeclaredExtractor.extract_routes(&[manifest])
    }

    #[test]
    fn test_extract_basic_route() {
        let routes = extract(
            r#"
path: example.com/shop/api
routes:
  - method: get
    path: /users
    handler: ListUsers
    responses:
      - type: { kind: slice, elem: { kind: named, package: example.com/shop/model, name: User } }
"#,
        );
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.method, HttpMethod::Get);
        assert_eq!(route.handler, "example.com/shop/api.ListUsers");
        assert_eq!(route.handler_name(), "ListUsers");
        assert_eq!(route.responses[0].status, 200);
        assert!(route.responses[0].body.is_some());
    }

    #[test]
    fn test_undeclared_path_params_are_added() {
        let routes = extract(
            r#"
path: example.com/shop/api
routes:
  - method: PUT
    path: /users/:id/orders/{order}
    handler: "*Handler.UpdateOrder"
    params:
      - { name: id, in: path, type: { kind: basic, name: int64 } }
      - { name: dryRun, in: query, type: { kind: basic, name: bool } }
    request:
      type: { kind: named, package: example.com/shop/model, name: Order }
"#,
        );
        let route = &routes[0];
        assert_eq!(route.handler, "example.com/shop/api.*Handler.UpdateOrder");

        let params: Vec<_> = route
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location, p.required))
            .collect();
        assert_eq!(
            params,
            vec![
                ("id", ParameterLocation::Path, true),
                ("dryRun", ParameterLocation::Query, false),
                ("order", ParameterLocation::Path, true),
            ]
        );
        assert!(route.request_body.is_some());
    }

    #[test]
    fn test_unsupported_method_is_skipped() {
        let routes = extract(
            r#"
path: example.com/shop/api
routes:
  - { method: CONNECT, path: /tunnel, handler: Tunnel }
  - { method: delete, path: /users/:id, handler: DeleteUser, package: example.com/shop/admin }
"#,
        );
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].package, "example.com/shop/admin");
    }

    #[test]
    fn test_path_params() {
        assert_eq!(
            path_params("/files/:dir/*path/{id}"),
            vec!["dir".to_string(), "path".to_string(), "id".to_string()]
        );
        assert!(path_params("/plain/path").is_empty());
    }
}
