//! Declaration input model.
//!
//! The resolver does not parse or type-check source code itself. A front end
//! that has already done so hands over one manifest per source file, describing
//! the file's top-level types, constant groups, functions and (optionally) the
//! routes a framework plugin found in it. Manifests are plain JSON or YAML:
//!
//! ```yaml
//! path: example.com/shop/model
//! types:
//!   - name: User
//!     type:
//!       kind: struct
//!       fields:
//!         - name: ID
//!           type: { kind: basic, name: int64 }
//!           tag: 'json:"id"'
//! ```

use serde::{Deserialize, Serialize};

/// Everything declared in one source file of a package.
///
/// Several manifests may share the same `path`; the declaration index merges them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Full package path (e.g. `example.com/shop/model`)
    pub path: String,
    /// Package name; defaults to the last segment of `path`
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default)]
    pub consts: Vec<ConstGroup>,
    #[serde(default)]
    pub funcs: Vec<FuncSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl PackageManifest {
    /// The package name, falling back to the last path segment.
    pub fn package_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A named type declaration such as `type User struct { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    /// Heading comment lines
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub type_params: Vec<TypeParamSpec>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

/// A generic type parameter of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParamSpec {
    pub name: String,
    #[serde(default = "default_constraint")]
    pub constraint: String,
}

fn default_constraint() -> String {
    "any".to_string()
}

/// A type expression, already resolved by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// Predeclared basic kind (`int64`, `string`, `untyped float`, ...)
    Basic { name: String },
    /// A literal used in type position
    Literal { lit: LiteralKind },
    /// Reference to a declared type, possibly instantiated with type arguments.
    /// A missing package means "the package of the enclosing declaration".
    Named {
        #[serde(default)]
        package: Option<String>,
        name: String,
        #[serde(default)]
        args: Vec<TypeExpr>,
    },
    Pointer { elem: Box<TypeExpr> },
    Slice { elem: Box<TypeExpr> },
    Array {
        elem: Box<TypeExpr>,
        #[serde(default)]
        len: Option<u64>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Struct {
        #[serde(default)]
        fields: Vec<Field>,
    },
    Interface,
    /// Type parameter of the enclosing generic declaration
    Param { index: usize, name: String },
    /// Call of a declared function (or conversion to a declared type), by key
    Call { func: String },
    /// Composite literal `T{...}`
    Composite {
        #[serde(rename = "type")]
        ty: Box<TypeExpr>,
    },
    /// Anything the front end could not classify
    Unknown {
        #[serde(default)]
        text: String,
    },
}

impl TypeExpr {
    pub fn basic(name: &str) -> Self {
        TypeExpr::Basic {
            name: name.to_string(),
        }
    }

    pub fn named(package: &str, name: &str) -> Self {
        TypeExpr::Named {
            package: Some(package.to_string()),
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn generic(package: &str, name: &str, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Named {
            package: Some(package.to_string()),
            name: name.to_string(),
            args,
        }
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice {
            elem: Box::new(elem),
        }
    }

    /// Short human readable rendering, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeExpr::Basic { name } => name.clone(),
            TypeExpr::Literal { lit } => format!("{:?} literal", lit),
            TypeExpr::Named {
                package,
                name,
                args,
            } => {
                let base = match package {
                    Some(package) => format!("{}.{}", package, name),
                    None => name.clone(),
                };
                if args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = args.iter().map(TypeExpr::describe).collect();
                    format!("{}[{}]", base, args.join(", "))
                }
            }
            TypeExpr::Pointer { elem } => format!("*{}", elem.describe()),
            TypeExpr::Slice { elem } => format!("[]{}", elem.describe()),
            TypeExpr::Array { elem, len } => match len {
                Some(len) => format!("[{}]{}", len, elem.describe()),
                None => format!("[...]{}", elem.describe()),
            },
            TypeExpr::Map { key, value } => {
                format!("map[{}]{}", key.describe(), value.describe())
            }
            TypeExpr::Struct { .. } => "struct{...}".to_string(),
            TypeExpr::Interface => "interface{}".to_string(),
            TypeExpr::Param { name, .. } => name.clone(),
            TypeExpr::Call { func } => format!("{}()", func),
            TypeExpr::Composite { ty } => format!("{}{{}}", ty.describe()),
            TypeExpr::Unknown { text } => format!("<{}>", text),
        }
    }
}

/// Kind of a literal in type position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Int,
    Float,
    Imag,
    Char,
    String,
    #[serde(other)]
    Other,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name; `None` for an embedded (anonymous) field
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Raw struct tag, e.g. `json:"id,omitempty" xml:"id"`
    #[serde(default)]
    pub tag: Option<String>,
    /// Heading comment lines
    #[serde(default)]
    pub doc: Vec<String>,
    /// Trailing comment lines
    #[serde(default)]
    pub comment: Vec<String>,
}

impl Field {
    pub fn named(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            tag: None,
            doc: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            name: None,
            ty,
            tag: None,
            doc: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_doc(mut self, line: &str) -> Self {
        self.doc.push(line.to_string());
        self
    }

    /// The comment block attached to the field: the heading comment when there
    /// is one, otherwise the trailing comment.
    pub fn comment_lines(&self) -> &[String] {
        if !self.doc.is_empty() {
            &self.doc
        } else {
            &self.comment
        }
    }
}

/// Whether an identifier is exported (starts with an uppercase letter).
pub fn is_exported(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

/// A parenthesised group of constant declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstGroup {
    #[serde(default)]
    pub doc: Vec<String>,
    pub items: Vec<ConstSpec>,
}

/// One constant of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstSpec {
    pub name: String,
    /// Declared type; when absent the previous constant's type carries over
    #[serde(rename = "type", default)]
    pub ty: Option<TypeExpr>,
    pub value: ConstValue,
    #[serde(default)]
    pub doc: Vec<String>,
}

/// The literal value of a constant, in its basic representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    /// Unsigned values that do not fit in `i64`
    UInt(u64),
    Float(f64),
    Str(String),
}

impl ConstValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConstValue::Bool(b) => serde_json::Value::Bool(*b),
            ConstValue::Int(i) => serde_json::Value::from(*i),
            ConstValue::UInt(u) => serde_json::Value::from(*u),
            // NaN and infinities have no JSON form
            ConstValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConstValue::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncSpec {
    pub name: String,
    #[serde(default)]
    pub receiver: Option<Receiver>,
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub results: Vec<TypeExpr>,
}

/// Method receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub type_name: String,
    #[serde(default)]
    pub pointer: bool,
}

/// A route found by a framework plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    /// Handler function name, or `Recv.Name` / `*Recv.Name` for methods
    pub handler: String,
    /// Package of the handler; defaults to the manifest's package
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub request: Option<PayloadSpec>,
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type", default = "default_param_type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_param_type() -> TypeExpr {
    TypeExpr::basic("string")
}

/// The location where a parameter value is extracted from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSpec {
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeExpr>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_status() -> u16 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_struct_type_from_yaml() {
        let yaml = r#"
path: example.com/shop/model
types:
  - name: User
    doc: ["User is a shop customer"]
    type:
      kind: struct
      fields:
        - name: ID
          type: { kind: basic, name: int64 }
          tag: 'json:"id"'
        - type: { kind: named, name: Audit }
        - name: Tags
          type: { kind: slice, elem: { kind: basic, name: string } }
          comment: ["@required"]
"#;
        let manifest: PackageManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.package_name(), "model");
        assert_eq!(manifest.types.len(), 1);

        let user = &manifest.types[0];
        let TypeExpr::Struct { fields } = &user.ty else {
            panic!("expected struct, got {:?}", user.ty);
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].tag.as_deref(), Some(r#"json:"id""#));
        assert!(fields[1].name.is_none());
        assert_eq!(
            fields[1].ty,
            TypeExpr::Named {
                package: None,
                name: "Audit".to_string(),
                args: vec![]
            }
        );
        assert_eq!(fields[2].comment_lines(), &["@required".to_string()]);
    }

    #[test]
    fn test_deserialize_unit_and_other_kinds() {
        let iface: TypeExpr = serde_yaml::from_str("kind: interface").unwrap();
        assert_eq!(iface, TypeExpr::Interface);

        let lit: TypeExpr = serde_yaml::from_str("{kind: literal, lit: hexfloat}").unwrap();
        assert_eq!(
            lit,
            TypeExpr::Literal {
                lit: LiteralKind::Other
            }
        );
    }

    #[test]
    fn test_const_values_keep_basic_representation() {
        let yaml = r#"
items:
  - { name: A, value: 1 }
  - { name: B, value: 1.5 }
  - { name: C, value: "c" }
  - { name: D, value: true }
"#;
        let group: ConstGroup = serde_yaml::from_str(yaml).unwrap();
        let values: Vec<_> = group.items.iter().map(|c| c.value.to_json()).collect();
        assert_eq!(
            values,
            vec![
                serde_json::json!(1),
                serde_json::json!(1.5),
                serde_json::json!("c"),
                serde_json::json!(true)
            ]
        );
    }

    #[test]
    fn test_large_unsigned_const_keeps_precision() {
        let spec: ConstSpec =
            serde_json::from_str(r#"{"name": "MaxID", "value": 18446744073709551615}"#).unwrap();
        assert_eq!(spec.value, ConstValue::UInt(u64::MAX));
        assert_eq!(spec.value.to_json(), serde_json::json!(u64::MAX));

        let spec: ConstSpec = serde_json::from_str(r#"{"name": "Small", "value": 7}"#).unwrap();
        assert_eq!(spec.value, ConstValue::Int(7));
    }

    #[test]
    fn test_package_name_explicit_wins() {
        let manifest = PackageManifest {
            path: "example.com/shop/v2".to_string(),
            name: "shop".to_string(),
            ..Default::default()
        };
        assert_eq!(manifest.package_name(), "shop");
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Name"));
        assert!(!is_exported("name"));
        assert!(!is_exported("_Name"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_field_prefers_heading_comment() {
        let mut field = Field::named("Name", TypeExpr::basic("string")).with_doc("@required");
        field.comment.push("trailing".to_string());
        assert_eq!(field.comment_lines(), &["@required".to_string()]);
    }

    #[test]
    fn test_describe_generic() {
        let ty = TypeExpr::generic(
            "example.com/kit",
            "Page",
            vec![TypeExpr::slice(TypeExpr::basic("string"))],
        );
        assert_eq!(ty.describe(), "example.com/kit.Page[[]string]");
    }
}
