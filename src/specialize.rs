//! Generic specialization
//!
//! After every operation has been resolved, each generic application marker
//! (`Box` applied to `[string]`) is replaced with a reference to a concrete
//! schema stored under `base[arg,...]`. The concrete schema is a copy of the
//! generic base with every type parameter marker substituted. Nested
//! applications are specialized in turn, and a key that is already stored or
//! currently being built is only referenced, so recursive generics terminate.

use crate::error::Diagnostic;
use crate::schema::{specialized_key, ExtendedType, Schema, SchemaTable};
use log::{debug, warn};

/// Limit for chains of distinct specializations, e.g. `T` growing into `[]T`
/// on every level of a recursive generic.
const MAX_DEPTH: usize = 64;

pub struct Specializer<'a> {
    schemas: &'a mut SchemaTable,
    diagnostics: &'a mut Vec<Diagnostic>,
    /// Specialized keys currently being built
    in_progress: Vec<String>,
}

impl<'a> Specializer<'a> {
    pub fn new(schemas: &'a mut SchemaTable, diagnostics: &'a mut Vec<Diagnostic>) -> Self {
        Self {
            schemas,
            diagnostics,
            in_progress: Vec::new(),
        }
    }

    /// Specialize every schema in the table. Running it again is a no-op.
    pub fn specialize_table(&mut self) {
        let keys: Vec<String> = self.schemas.keys().cloned().collect();
        debug!("Specializing {} schemas", keys.len());

        for key in keys {
            let schema = match self.schemas.get(&key) {
                Some(schema) => schema.clone(),
                None => continue,
            };
            let specialized = self.specialize(schema);
            self.schemas.insert(key, specialized);
        }
    }

    /// Replace every generic application found in `schema`.
    pub fn specialize(&mut self, mut schema: Schema) -> Schema {
        if schema.is_ref() {
            return schema;
        }

        if let Some((generic, args)) = schema.as_specific() {
            let (generic, args) = (generic.clone(), args.to_vec());
            if args.iter().any(contains_param) {
                // Still generic, e.g. a field of a generic template
                return schema;
            }
            let mut result = self.apply(&generic, args);
            if schema.description.is_some() {
                result.description = schema.description;
            }
            return result;
        }

        if let Some(items) = schema.items.take() {
            schema.items = Some(Box::new(self.specialize(*items)));
        }
        if let Some(value) = schema.additional_properties.take() {
            schema.additional_properties = Some(Box::new(self.specialize(*value)));
        }
        schema.extended = match schema.extended.take() {
            Some(ExtendedType::Map { map_key, map_value }) => Some(ExtendedType::Map {
                map_key: Box::new(self.specialize(*map_key)),
                map_value: Box::new(self.specialize(*map_value)),
            }),
            other => other,
        };
        let properties = std::mem::take(&mut schema.properties);
        schema.properties = properties
            .into_iter()
            .map(|(name, property)| (name, self.specialize(property)))
            .collect();

        schema
    }

    fn apply(&mut self, generic: &Schema, args: Vec<Schema>) -> Schema {
        let args: Vec<Schema> = args.into_iter().map(|arg| self.specialize(arg)).collect();

        let base_key = match generic.ref_key() {
            Some(key) => key.to_string(),
            None => return self.unknown("generic", "generic base is not a named schema"),
        };
        let base = match self.schemas.get(&base_key) {
            Some(base) => base.clone(),
            None => return self.unknown(&base_key, "generic base not found"),
        };

        // The base is itself an application: substitute our arguments into its
        // arguments and specialize that instead
        if let Some((inner_generic, inner_args)) = base.as_specific() {
            let merged = inner_args
                .iter()
                .map(|arg| substitute(arg.clone(), &args))
                .collect();
            return self.apply(inner_generic, merged);
        }

        if let Some(param) = base.as_type_param() {
            return match args.get(param.index) {
                Some(arg) => arg.clone(),
                None => self.unknown(&base_key, "missing type argument"),
            };
        }

        let key = specialized_key(&base_key, &args);
        if self.schemas.contains_key(&key) || self.in_progress.contains(&key) {
            return Schema::reference(&key);
        }
        if self.in_progress.len() >= MAX_DEPTH {
            return self.unknown(&key, "specialization does not terminate");
        }

        debug!("Specializing {}", key);
        self.in_progress.push(key.clone());

        let mut specialized = substitute(base, &args);
        specialized.specialized = true;
        specialized.type_params.clear();
        specialized.key = Some(key.clone());
        let specialized = self.specialize(specialized);

        self.in_progress.pop();
        self.schemas.insert(key.clone(), specialized);
        Schema::reference(&key)
    }

    fn unknown(&mut self, subject: &str, message: &str) -> Schema {
        warn!("Cannot specialize {}: {}", subject, message);
        self.diagnostics.push(Diagnostic::new(subject, message));
        Schema::unknown()
    }
}

/// Replace type parameter markers with the matching argument. References are
/// left alone; the schemas they point to are specialized on their own.
fn substitute(mut schema: Schema, args: &[Schema]) -> Schema {
    if schema.is_ref() {
        return schema;
    }

    if let Some(param) = schema.as_type_param() {
        let mut arg = match args.get(param.index) {
            Some(arg) => arg.clone(),
            None => return schema,
        };
        if schema.description.is_some() {
            arg.description = schema.description;
        }
        return arg;
    }

    if let Some(items) = schema.items.take() {
        schema.items = Some(Box::new(substitute(*items, args)));
    }
    if let Some(value) = schema.additional_properties.take() {
        schema.additional_properties = Some(Box::new(substitute(*value, args)));
    }
    schema.extended = match schema.extended.take() {
        Some(ExtendedType::Map { map_key, map_value }) => Some(ExtendedType::Map {
            map_key: Box::new(substitute(*map_key, args)),
            map_value: Box::new(substitute(*map_value, args)),
        }),
        Some(ExtendedType::Specific {
            generic,
            args: inner,
        }) => Some(ExtendedType::Specific {
            generic,
            args: inner.into_iter().map(|arg| substitute(arg, args)).collect(),
        }),
        other => other,
    };
    let properties = std::mem::take(&mut schema.properties);
    schema.properties = properties
        .into_iter()
        .map(|(name, property)| (name, substitute(property, args)))
        .collect();

    schema
}

/// Whether an unbound type parameter occurs anywhere in the schema.
fn contains_param(schema: &Schema) -> bool {
    if schema.is_ref() {
        return false;
    }
    match &schema.extended {
        Some(ExtendedType::Param { .. }) => return true,
        Some(ExtendedType::Specific { args, .. }) if args.iter().any(contains_param) => {
            return true
        }
        Some(ExtendedType::Map { map_key, map_value })
            if contains_param(map_key) || contains_param(map_value) =>
        {
            return true
        }
        _ => {}
    }
    schema.items.as_deref().map_or(false, contains_param)
        || schema
            .additional_properties
            .as_deref()
            .map_or(false, contains_param)
        || schema.properties.values().any(contains_param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DeclarationIndex, IndexScope};
    use crate::model::{Field, PackageManifest, TypeExpr};
    use crate::schema::SchemaKind;
    use crate::schema_builder::SchemaBuilder;
    use pretty_assertions::assert_eq;

    const KIT: &str = r#"
path: example.com/kit
types:
  - name: Pair
    type_params: [{ name: A }, { name: B }]
    type:
      kind: struct
      fields:
        - { name: First, type: { kind: param, index: 0, name: A } }
        - { name: Second, type: { kind: param, index: 1, name: B } }
  - name: Box
    type_params: [{ name: T }]
    type:
      kind: struct
      fields:
        - name: Inner
          doc: ["the wrapped pair"]
          type:
            kind: named
            name: Pair
            args:
              - { kind: param, index: 0, name: T }
              - { kind: basic, name: int }
  - name: Tree
    type_params: [{ name: T }]
    type:
      kind: struct
      fields:
        - { name: Value, type: { kind: param, index: 0, name: T } }
        - name: Children
          type:
            kind: slice
            elem: { kind: named, name: Tree, args: [{ kind: param, index: 0, name: T }] }
  - name: Page
    type_params: [{ name: T }]
    type:
      kind: named
      name: Box
      args: [{ kind: slice, elem: { kind: param, index: 0, name: T } }]
  - name: Nest
    type_params: [{ name: T }]
    type:
      kind: struct
      fields:
        - name: Next
          type:
            kind: pointer
            elem: { kind: named, name: Nest, args: [{ kind: slice, elem: { kind: param, index: 0, name: T } }] }
"#;

    struct Session {
        schemas: SchemaTable,
        diagnostics: Vec<Diagnostic>,
    }

    /// Resolve `ty` in a fresh session, then specialize the table and the
    /// resolved schema.
    fn run(ty: &TypeExpr) -> (Schema, Session) {
        let (mut schemas, session) = run_all(std::slice::from_ref(ty));
        (schemas.remove(0), session)
    }

    /// Resolve every expression in one session before specializing.
    fn run_all(types: &[TypeExpr]) -> (Vec<Schema>, Session) {
        let manifest: PackageManifest = serde_yaml::from_str(KIT).unwrap();
        let index = DeclarationIndex::build(&[manifest], &IndexScope::default());
        let mut session = Session {
            schemas: SchemaTable::new(),
            diagnostics: Vec::new(),
        };
        let resolved: Vec<Schema> = {
            let mut builder = SchemaBuilder::new(
                &index,
                &mut session.schemas,
                &mut session.diagnostics,
                "example.com/kit",
                "application/json",
            );
            types.iter().map(|ty| builder.resolve(ty)).collect()
        };

        let mut specializer = Specializer::new(&mut session.schemas, &mut session.diagnostics);
        specializer.specialize_table();
        let resolved = resolved
            .into_iter()
            .map(|schema| specializer.specialize(schema))
            .collect();
        (resolved, session)
    }

    fn kit(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::generic("example.com/kit", name, args)
    }

    #[test]
    fn test_nested_arguments_propagate() {
        let (schema, session) = run(&kit("Box", vec![TypeExpr::basic("string")]));

        assert_eq!(schema, Schema::reference("example.com_kit.Box[string]"));
        let boxed = &session.schemas["example.com_kit.Box[string]"];
        assert!(boxed.specialized);
        assert!(boxed.type_params.is_empty());

        let inner = &boxed.properties["Inner"];
        assert_eq!(inner.ref_key(), Some("example.com_kit.Pair[string,integer]"));
        assert_eq!(inner.description.as_deref(), Some("the wrapped pair"));

        let pair = &session.schemas["example.com_kit.Pair[string,integer]"];
        assert_eq!(pair.properties["First"], Schema::string());
        assert_eq!(pair.properties["Second"], Schema::int64());
        assert!(!session.schemas.contains_key("example.com_kit.Pair[T,integer]"));
    }

    #[test]
    fn test_templates_are_kept_generic() {
        let (_, session) = run(&kit("Box", vec![TypeExpr::basic("string")]));
        let template = &session.schemas["example.com_kit.Box"];
        assert_eq!(template.type_params.len(), 1);
        assert_eq!(
            template.properties["Inner"].kind(),
            SchemaKind::GenericApplication
        );
    }

    #[test]
    fn test_specializing_twice_is_a_no_op() {
        let (schema, mut session) = run(&kit("Box", vec![TypeExpr::basic("string")]));
        let before = session.schemas.clone();

        let mut specializer = Specializer::new(&mut session.schemas, &mut session.diagnostics);
        specializer.specialize_table();
        let again = specializer.specialize(schema.clone());

        assert_eq!(again, schema);
        assert_eq!(session.schemas, before);
    }

    #[test]
    fn test_recursive_generic_terminates() {
        let (schema, session) = run(&kit("Tree", vec![TypeExpr::basic("string")]));
        assert_eq!(schema.ref_key(), Some("example.com_kit.Tree[string]"));

        let tree = &session.schemas["example.com_kit.Tree[string]"];
        assert_eq!(tree.properties["Value"], Schema::string());
        assert_eq!(
            tree.properties["Children"],
            Schema::array(Schema::reference("example.com_kit.Tree[string]"))
        );
    }

    #[test]
    fn test_generic_alias_of_application_merges_arguments() {
        let (schema, session) = run(&kit("Page", vec![TypeExpr::basic("bool")]));
        assert_eq!(schema.ref_key(), Some("example.com_kit.Box[[]boolean]"));
        let pair = &session.schemas["example.com_kit.Pair[[]boolean,integer]"];
        assert_eq!(pair.properties["First"], Schema::array(Schema::boolean()));
    }

    #[test]
    fn test_growing_specialization_is_cut_off() {
        let (_, session) = run(&kit("Nest", vec![TypeExpr::basic("string")]));
        assert!(session
            .diagnostics
            .iter()
            .any(|d| d.message.contains("does not terminate")));
    }

    #[test]
    fn test_distinct_inline_arguments_get_distinct_specializations() {
        let first = TypeExpr::Struct {
            fields: vec![Field::named("A", TypeExpr::basic("int"))],
        };
        let second = TypeExpr::Struct {
            fields: vec![Field::named("B", TypeExpr::basic("string"))],
        };
        let (resolved, session) = run_all(&[kit("Box", vec![first]), kit("Box", vec![second])]);

        assert_eq!(
            resolved[0].ref_key(),
            Some("example.com_kit.Box[struct{A:int64}]")
        );
        assert_eq!(
            resolved[1].ref_key(),
            Some("example.com_kit.Box[struct{B:string}]")
        );

        let pair = &session.schemas["example.com_kit.Pair[struct{B:string},integer]"];
        let first_field: Vec<&str> = pair.properties["First"]
            .properties
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(first_field, vec!["B"]);
    }

    #[test]
    fn test_map_arguments_keep_value_format() {
        let map_of = |value: &str| TypeExpr::Map {
            key: Box::new(TypeExpr::basic("string")),
            value: Box::new(TypeExpr::basic(value)),
        };
        let (resolved, _) = run_all(&[
            kit("Box", vec![map_of("int32")]),
            kit("Box", vec![map_of("int64")]),
        ]);

        assert_eq!(
            resolved[0].ref_key(),
            Some("example.com_kit.Box[map[string]int32]")
        );
        assert_eq!(
            resolved[1].ref_key(),
            Some("example.com_kit.Box[map[string]int64]")
        );
    }

    #[test]
    fn test_unrelated_schemas_unchanged() {
        let mut schemas = SchemaTable::new();
        schemas.insert("m.A".to_string(), Schema::array(Schema::string()));
        let before = schemas.clone();
        let mut diagnostics = Vec::new();
        Specializer::new(&mut schemas, &mut diagnostics).specialize_table();
        assert_eq!(schemas, before);
        assert!(diagnostics.is_empty());
    }
}
