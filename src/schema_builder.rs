use crate::comment::Comment;
use crate::definition::{Declaration, DeclarationIndex, TypeDeclaration};
use crate::error::Diagnostic;
use crate::model::{is_exported, Field, LiteralKind, TypeExpr};
use crate::schema::{EnumItem, ExtendedType, Schema, SchemaTable, TypeParam};
use crate::tag;
use log::{debug, warn};

/// Schema builder - converts type expressions to OpenAPI schemas
///
/// Named types are expanded once into the schema table and referenced from
/// then on. A type that is already being expanded further up the call chain
/// is returned as a bare reference, which is what makes recursive types
/// terminate.
pub struct SchemaBuilder<'a> {
    /// Declarations to expand named types from
    index: &'a DeclarationIndex,
    /// Named schemas built so far, by model key
    schemas: &'a mut SchemaTable,
    /// Degraded resolutions
    diagnostics: &'a mut Vec<Diagnostic>,
    /// Selects the struct tag namespace used for property names
    content_type: String,
    /// Model keys currently being expanded
    stack: Vec<String>,
    /// Type parameters of the declaration being expanded
    type_params: Vec<TypeParam>,
    /// Package that package-less named references are relative to
    package: String,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(
        index: &'a DeclarationIndex,
        schemas: &'a mut SchemaTable,
        diagnostics: &'a mut Vec<Diagnostic>,
        package: &str,
        content_type: &str,
    ) -> Self {
        Self {
            index,
            schemas,
            diagnostics,
            content_type: content_type.to_string(),
            stack: Vec::new(),
            type_params: Vec::new(),
            package: package.to_string(),
        }
    }

    /// Resolve a type expression to a schema. Never fails: anything that
    /// cannot be modelled becomes an unknown schema plus a diagnostic.
    pub fn resolve(&mut self, ty: &TypeExpr) -> Schema {
        match ty {
            TypeExpr::Basic { name } => self.basic(name),
            TypeExpr::Literal { lit } => self.literal(*lit),
            TypeExpr::Named {
                package,
                name,
                args,
            } => self.resolve_named(package.as_deref(), name, args),
            TypeExpr::Pointer { elem } => self.resolve(elem),
            TypeExpr::Slice { elem } | TypeExpr::Array { elem, .. } => {
                Schema::array(self.resolve(elem))
            }
            TypeExpr::Map { key, value } => {
                let key = self.resolve(key);
                let value = self.resolve(value);
                Schema::map(key, value)
            }
            TypeExpr::Struct { fields } => self.resolve_struct(fields),
            TypeExpr::Interface => Schema::any("Any Type"),
            TypeExpr::Param { index, name } => match self.type_params.get(*index) {
                Some(param) => Schema::type_param(param.clone()),
                None => self.unknown(name, "type parameter outside of a generic declaration"),
            },
            TypeExpr::Call { func } => self.resolve_call(func),
            TypeExpr::Composite { ty } => self.resolve(ty),
            TypeExpr::Unknown { text } => self.unknown(text, "unclassifiable expression"),
        }
    }

    fn basic(&mut self, name: &str) -> Schema {
        let kind = name.strip_prefix("untyped ").unwrap_or(name);
        match kind {
            "int" | "uint" | "int64" | "uint64" => Schema::int64(),
            "int8" | "int16" | "int32" | "uint8" | "uint16" | "uint32" => Schema::int32(),
            "byte" | "rune" => Schema::bytes(),
            "float32" => Schema::float(),
            "float64" | "float" => Schema::double(),
            "bool" => Schema::boolean(),
            "string" => Schema::string(),
            _ => self.unknown(name, "unsupported basic kind"),
        }
    }

    fn literal(&mut self, lit: LiteralKind) -> Schema {
        match lit {
            LiteralKind::Int => Schema::int64(),
            LiteralKind::Float | LiteralKind::Imag => Schema::double(),
            LiteralKind::Char | LiteralKind::String => Schema::string(),
            LiteralKind::Other => self.unknown("literal", "unsupported literal kind"),
        }
    }

    fn resolve_named(&mut self, package: Option<&str>, name: &str, args: &[TypeExpr]) -> Schema {
        let package = package.unwrap_or(&self.package).to_string();

        if let Some(schema) = well_known(&package, name) {
            return schema;
        }

        let index = self.index;
        let decl = match index.lookup_type(&package, name) {
            Some(decl) => decl,
            None => {
                return self.unknown(&format!("{}.{}", package, name), "declaration not found")
            }
        };

        // Arguments belong to the enclosing context, not to `decl`
        let args: Vec<Schema> = args.iter().map(|arg| self.resolve(arg)).collect();

        if args.len() == 1 && decl.is_param_alias() {
            debug!("Eliding alias {} to its argument", decl.key());
            return args.into_iter().next().unwrap_or_else(Schema::unknown);
        }

        let base = self.resolve_declaration(decl);
        if args.is_empty() {
            base
        } else {
            Schema::specific(base, args)
        }
    }

    /// Expand a declaration into the table (once) and return a reference to it.
    pub fn resolve_declaration(&mut self, decl: &TypeDeclaration) -> Schema {
        let key = decl.model_key();

        if self.stack.contains(&key) {
            debug!("{} is already being resolved, referencing it", key);
            return Schema::reference(&key);
        }
        if self.schemas.contains_key(&key) {
            return Schema::reference(&key);
        }

        debug!("Resolving declaration {}", decl.key());
        self.stack.push(key.clone());
        let saved_params = std::mem::replace(&mut self.type_params, decl.type_params());
        let saved_package = std::mem::replace(&mut self.package, decl.package.clone());

        let mut schema = self.resolve(&decl.spec.ty);

        self.type_params = saved_params;
        self.package = saved_package;

        if !decl.enums.is_empty() {
            self.attach_enums(&mut schema, &decl.enums);
        }

        Comment::parse(&decl.spec.doc).apply_to_schema(&mut schema);
        if !schema.is_ref() {
            schema.title = Some(upper_camel(&format!(
                "{}{}",
                decl.package_name, decl.spec.name
            )));
            if !decl.spec.type_params.is_empty() {
                schema.type_params = decl.type_params();
            }
        }
        schema.key = Some(key.clone());

        self.stack.pop();
        self.schemas.insert(key.clone(), schema);
        Schema::reference(&key)
    }

    fn attach_enums(&mut self, schema: &mut Schema, enums: &[EnumItem]) {
        // Never mutate a referenced schema; copy it inline instead
        if schema.is_ref() {
            match schema.unref(self.schemas).cloned() {
                Some(target) => *schema = target,
                None => debug!("Cannot inline {:?} for enum items", schema.reference),
            }
        }
        schema.enum_values = enums.iter().map(|item| item.value.clone()).collect();
        schema.extended = Some(ExtendedType::Enum {
            enum_items: enums.to_vec(),
        });
    }

    fn resolve_struct(&mut self, fields: &[Field]) -> Schema {
        let mut schema = Schema::object();
        let namespace = tag::namespace_for(&self.content_type);

        for field in fields {
            let comment = Comment::parse(field.comment_lines());
            if comment.ignored() {
                continue;
            }

            let name = match &field.name {
                Some(name) => name,
                None => {
                    // Embedded field: merge its properties
                    let embedded = self.resolve(&field.ty);
                    match embedded.unref(self.schemas) {
                        Some(target) => {
                            for (prop, value) in &target.properties {
                                schema.properties.insert(prop.clone(), value.clone());
                            }
                            for required in &target.required {
                                if !schema.required.contains(required) {
                                    schema.required.push(required.clone());
                                }
                            }
                        }
                        None => debug!(
                            "Embedded {} is still being resolved, no properties merged",
                            field.ty.describe()
                        ),
                    }
                    continue;
                }
            };

            if !is_exported(name) {
                continue;
            }

            let prop_name = property_name(name, field.tag.as_deref(), namespace);
            if prop_name == "-" {
                continue;
            }

            let mut field_schema = self.resolve(&field.ty);
            comment.apply_to_schema(&mut field_schema);
            if comment.required() && !schema.required.contains(&prop_name) {
                schema.required.push(prop_name.clone());
            }
            schema.properties.insert(prop_name, field_schema);
        }

        schema
    }

    fn resolve_call(&mut self, func: &str) -> Schema {
        let index = self.index;
        match index.lookup(func) {
            Some(Declaration::Function(f)) => match f.spec.results.first() {
                Some(result) => {
                    let saved_params = std::mem::take(&mut self.type_params);
                    let saved_package = std::mem::replace(&mut self.package, f.package.clone());
                    let schema = self.resolve(result);
                    self.type_params = saved_params;
                    self.package = saved_package;
                    schema
                }
                None => self.unknown(func, "function has no results"),
            },
            // Conversion to a declared type
            Some(Declaration::Type(t)) => self.resolve_declaration(t),
            _ => self.unknown(func, "function not found"),
        }
    }

    fn unknown(&mut self, subject: &str, message: &str) -> Schema {
        let subject = match self.stack.last() {
            Some(parent) => format!("{} (in {})", subject, parent),
            None => subject.to_string(),
        };
        warn!("Cannot resolve {}: {}", subject, message);
        self.diagnostics.push(Diagnostic::new(subject, message));
        Schema::unknown()
    }
}

/// Fixed schemas for external types that should not be expanded.
fn well_known(package: &str, name: &str) -> Option<Schema> {
    let schema = match (package, name) {
        ("time", "Time") | ("database/sql", "NullTime") => Schema::date_time(),
        ("encoding/json", "RawMessage") | ("json", "RawMessage") => Schema::any("Any Json Type"),
        ("database/sql", "NullString") | ("database/sql", "NullByte") => Schema::string(),
        ("database/sql", "NullInt64") => Schema::int64(),
        ("database/sql", "NullInt32") => Schema::int32(),
        ("database/sql", "NullInt") | ("database/sql", "NullInt16") => Schema::integer(),
        ("database/sql", "NullFloat64") => Schema::double(),
        ("database/sql", "NullBool") => Schema::boolean(),
        _ => return None,
    };
    Some(schema)
}

/// Property name from the struct tag namespace, falling back to the field name.
fn property_name(field_name: &str, raw_tag: Option<&str>, namespace: Option<&str>) -> String {
    let (raw, namespace) = match (raw_tag, namespace) {
        (Some(raw), Some(namespace)) => (raw, namespace),
        _ => return field_name.to_string(),
    };
    let tags = tag::parse(raw);
    match tags.get(namespace) {
        Some(value) => {
            let name = value.split(',').next().unwrap_or_default();
            if name.is_empty() {
                field_name.to_string()
            } else {
                name.to_string()
            }
        }
        None => field_name.to_string(),
    }
}

fn upper_camel(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut upper_next = true;
    for c in text.chars() {
        if !c.is_alphanumeric() {
            upper_next = true;
            continue;
        }
        if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
