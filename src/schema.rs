use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of every schema reference
pub const REF_PREFIX: &str = "#/components/schemas/";

/// Named schemas keyed by model key
pub type SchemaTable = BTreeMap<String, Schema>;

/// OpenAPI Schema definition, extended with the markers the resolver needs
/// for enums, maps and generics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enum values for enum types
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,
    /// Required property names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(rename = "x-extended-type", skip_serializing_if = "Option::is_none")]
    pub extended: Option<ExtendedType>,
    /// Type parameters of a generic declaration
    #[serde(rename = "x-type-params", default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    /// Set on schemas produced by generic specialization
    #[serde(rename = "x-specialized", default, skip_serializing_if = "is_false")]
    pub specialized: bool,
    /// Model key this schema was built for, when it differs from its title
    #[serde(skip)]
    pub key: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Extra type information that plain OpenAPI cannot express
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtendedType {
    Map {
        #[serde(rename = "mapKey")]
        map_key: Box<Schema>,
        #[serde(rename = "mapValue")]
        map_value: Box<Schema>,
    },
    Any,
    Enum {
        #[serde(rename = "enumItems")]
        enum_items: Vec<EnumItem>,
    },
    /// A generic schema applied to arguments, pending specialization
    Specific { generic: Box<Schema>, args: Vec<Schema> },
    /// An unbound type parameter of a generic declaration
    Param {
        #[serde(rename = "typeParam")]
        type_param: TypeParam,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumItem {
    pub key: String,
    pub value: serde_json::Value,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    pub index: usize,
    pub name: String,
    pub constraint: String,
}

/// Coarse classification of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Primitive,
    Object,
    Array,
    Map,
    Reference,
    GenericParameter,
    GenericApplication,
    Enum,
    Unknown,
}

impl Schema {
    pub fn reference(key: &str) -> Self {
        Self {
            reference: Some(ref_path(key)),
            ..Default::default()
        }
    }

    pub fn primitive(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self::primitive("integer", None)
    }

    pub fn int32() -> Self {
        Self::primitive("integer", Some("int32"))
    }

    pub fn int64() -> Self {
        Self::primitive("integer", Some("int64"))
    }

    pub fn float() -> Self {
        Self::primitive("number", Some("float"))
    }

    pub fn double() -> Self {
        Self::primitive("number", Some("double"))
    }

    pub fn boolean() -> Self {
        Self::primitive("boolean", None)
    }

    pub fn string() -> Self {
        Self::primitive("string", None)
    }

    pub fn bytes() -> Self {
        Self::primitive("string", Some("byte"))
    }

    pub fn date_time() -> Self {
        Self::primitive("string", Some("date-time"))
    }

    pub fn object() -> Self {
        Self::primitive("object", None)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Object with a typed key; the value schema doubles as `additionalProperties`.
    pub fn map(key: Schema, value: Schema) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(value.clone())),
            extended: Some(ExtendedType::Map {
                map_key: Box::new(key),
                map_value: Box::new(value),
            }),
            ..Default::default()
        }
    }

    /// Arbitrary value (interfaces, raw JSON).
    pub fn any(description: &str) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            description: Some(description.to_string()),
            extended: Some(ExtendedType::Any),
            ..Default::default()
        }
    }

    /// Marker for something that could not be modelled.
    pub fn unknown() -> Self {
        Self {
            extended: Some(ExtendedType::Unknown),
            ..Default::default()
        }
    }

    pub fn type_param(param: TypeParam) -> Self {
        Self {
            extended: Some(ExtendedType::Param { type_param: param }),
            ..Default::default()
        }
    }

    /// Generic application marker: `generic` applied to `args`.
    pub fn specific(generic: Schema, args: Vec<Schema>) -> Self {
        Self {
            extended: Some(ExtendedType::Specific {
                generic: Box::new(generic),
                args,
            }),
            ..Default::default()
        }
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    /// Model key of a reference schema.
    pub fn ref_key(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix(REF_PREFIX).unwrap_or(r))
    }

    pub fn kind(&self) -> SchemaKind {
        if self.is_ref() {
            return SchemaKind::Reference;
        }
        match &self.extended {
            Some(ExtendedType::Specific { .. }) => return SchemaKind::GenericApplication,
            Some(ExtendedType::Param { .. }) => return SchemaKind::GenericParameter,
            Some(ExtendedType::Enum { .. }) => return SchemaKind::Enum,
            Some(ExtendedType::Map { .. }) => return SchemaKind::Map,
            Some(ExtendedType::Unknown) => return SchemaKind::Unknown,
            Some(ExtendedType::Any) | None => {}
        }
        match self.schema_type.as_deref() {
            Some("array") => SchemaKind::Array,
            Some("object") => SchemaKind::Object,
            Some(_) => SchemaKind::Primitive,
            None => SchemaKind::Unknown,
        }
    }

    /// The `(generic, args)` pair of a generic application marker.
    pub fn as_specific(&self) -> Option<(&Schema, &[Schema])> {
        match &self.extended {
            Some(ExtendedType::Specific { generic, args }) if !self.is_ref() => {
                Some((generic.as_ref(), args.as_slice()))
            }
            _ => None,
        }
    }

    pub fn as_type_param(&self) -> Option<&TypeParam> {
        match &self.extended {
            Some(ExtendedType::Param { type_param }) if !self.is_ref() => Some(type_param),
            _ => None,
        }
    }

    /// Deterministic identity of this schema when used as a type argument.
    ///
    /// Inline composites are keyed by their structure, so two different
    /// anonymous structs never share a specialization.
    pub fn key(&self) -> String {
        self.key_at(false)
    }

    /// Key of a schema nested inside a composite key. Primitives carry their
    /// format here (`[]int32`, `map[string]int64`).
    fn nested_key(&self) -> String {
        self.key_at(true)
    }

    fn key_at(&self, nested: bool) -> String {
        if let Some(key) = self.ref_key() {
            return key.to_string();
        }
        if let Some(key) = &self.key {
            return key.clone();
        }
        if let Some(title) = &self.title {
            return title.clone();
        }
        match &self.extended {
            Some(ExtendedType::Param { type_param }) => return type_param.name.clone(),
            Some(ExtendedType::Specific { generic, args }) => {
                return specialized_key(&generic.key(), args)
            }
            Some(ExtendedType::Map {
                map_key, map_value, ..
            }) => return format!("map[{}]{}", map_key.nested_key(), map_value.nested_key()),
            Some(ExtendedType::Any) => return "any".to_string(),
            Some(ExtendedType::Unknown) => return "unknown".to_string(),
            Some(ExtendedType::Enum { .. }) | None => {}
        }
        match (self.schema_type.as_deref(), &self.items) {
            (Some("array"), Some(items)) => format!("[]{}", items.nested_key()),
            (Some("object"), _) if !self.properties.is_empty() => {
                let fields: Vec<String> = self
                    .properties
                    .iter()
                    .map(|(name, prop)| format!("{}:{}", name, prop.nested_key()))
                    .collect();
                format!("struct{{{}}}", fields.join(";"))
            }
            (Some("object"), _) => match &self.additional_properties {
                Some(value) => format!("map[string]{}", value.nested_key()),
                None => "object".to_string(),
            },
            (Some(schema_type), _) => match (&self.format, nested) {
                (Some(format), true) => format.clone(),
                _ => schema_type.to_string(),
            },
            (None, _) => "unknown".to_string(),
        }
    }

    /// Follow references through the table until a concrete schema is reached.
    pub fn unref<'a>(&'a self, schemas: &'a SchemaTable) -> Option<&'a Schema> {
        let mut current = self;
        // A chain longer than the table is a reference loop
        for _ in 0..=schemas.len() {
            match current.ref_key() {
                Some(key) => current = schemas.get(key)?,
                None => return Some(current),
            }
        }
        None
    }
}

/// `#/components/schemas/<key>`
pub fn ref_path(key: &str) -> String {
    format!("{}{}", REF_PREFIX, key)
}

/// Model key of a declaration: package path with `/` replaced by `_`, a dot, then the name.
pub fn model_key(package_path: &str, name: &str) -> String {
    format!("{}.{}", package_path.replace('/', "_"), name)
}

/// `base[arg1,arg2]`, or just `base` without arguments.
pub fn specialized_key(base: &str, args: &[Schema]) -> String {
    if args.is_empty() {
        return base.to_string();
    }
    let args: Vec<String> = args.iter().map(Schema::key).collect();
    format!("{}[{}]", base, args.join(","))
}
