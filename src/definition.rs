//! Declaration index
//!
//! Every top-level function, named type and constant group found in the
//! loaded manifests is recorded under a stable key:
//!
//! - types and functions: `<package-path>.<Name>`
//! - methods: `<package-path>.<Recv>.<Name>`, or `<package-path>.*<Recv>.<Name>`
//!   for pointer receivers
//! - constant groups: `<package-path>.<FirstConstant>`
//!
//! Constant groups typed with a named type of the same package contribute
//! enum items to that type's declaration.

use crate::comment::Comment;
use crate::model::{ConstGroup, FuncSpec, PackageManifest, TypeExpr, TypeSpec};
use crate::schema::{self, EnumItem, TypeParam};
use log::debug;
use std::collections::HashMap;

/// A function or method declaration
#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub package: String,
    pub package_name: String,
    pub spec: FuncSpec,
}

impl FunctionDeclaration {
    pub fn key(&self) -> String {
        match &self.spec.receiver {
            Some(receiver) if receiver.pointer => format!(
                "{}.*{}.{}",
                self.package, receiver.type_name, self.spec.name
            ),
            Some(receiver) => format!(
                "{}.{}.{}",
                self.package, receiver.type_name, self.spec.name
            ),
            None => format!("{}.{}", self.package, self.spec.name),
        }
    }

    pub fn comment(&self) -> Comment {
        Comment::parse(&self.spec.doc)
    }
}

/// A named type declaration and the enum items contributed to it
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub package: String,
    pub package_name: String,
    pub spec: TypeSpec,
    /// Filled in while indexing; never changed afterwards
    pub enums: Vec<EnumItem>,
}

impl TypeDeclaration {
    pub fn key(&self) -> String {
        format!("{}.{}", self.package, self.spec.name)
    }

    pub fn model_key(&self) -> String {
        schema::model_key(&self.package, &self.spec.name)
    }

    pub fn type_params(&self) -> Vec<TypeParam> {
        self.spec
            .type_params
            .iter()
            .enumerate()
            .map(|(index, param)| TypeParam {
                index,
                name: param.name.clone(),
                constraint: param.constraint.clone(),
            })
            .collect()
    }

    /// `type Alias[T any] T`: a generic whose body is exactly its only parameter.
    pub fn is_param_alias(&self) -> bool {
        self.spec.type_params.len() == 1
            && matches!(self.spec.ty, TypeExpr::Param { index: 0, .. })
    }
}

/// A group of constants
#[derive(Debug, Clone)]
pub struct ConstGroupDeclaration {
    pub package: String,
    pub package_name: String,
    pub group: ConstGroup,
}

impl ConstGroupDeclaration {
    pub fn key(&self) -> String {
        let first = self
            .group
            .items
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("_");
        format!("{}.{}", self.package, first)
    }
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDeclaration),
    Type(TypeDeclaration),
    ConstGroup(ConstGroupDeclaration),
}

impl Declaration {
    pub fn key(&self) -> String {
        match self {
            Declaration::Function(f) => f.key(),
            Declaration::Type(t) => t.key(),
            Declaration::ConstGroup(c) => c.key(),
        }
    }
}

/// Which packages get indexed
#[derive(Debug, Clone, Default)]
pub struct IndexScope {
    /// Entry module path; everything when unset
    pub module: Option<String>,
    /// Extra package path prefixes to include
    pub depends: Vec<String>,
}

impl IndexScope {
    pub fn includes(&self, package: &str) -> bool {
        let module = match &self.module {
            Some(module) => module,
            None => return true,
        };
        within(package, module) || self.depends.iter().any(|dep| within(package, dep))
    }
}

fn within(package: &str, prefix: &str) -> bool {
    package == prefix
        || package
            .strip_prefix(prefix)
            .map_or(false, |rest| rest.starts_with('/'))
}

/// All declarations of an analysis session, by key
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    declarations: HashMap<String, Declaration>,
    /// Package path -> package name
    packages: HashMap<String, String>,
    /// Constant group keys in load order
    const_groups: Vec<String>,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every in-scope manifest, then link constant groups to their types.
    pub fn build(manifests: &[PackageManifest], scope: &IndexScope) -> Self {
        let mut index = Self::new();

        for manifest in manifests {
            if !scope.includes(&manifest.path) {
                debug!("Skipping out-of-scope package {}", manifest.path);
                continue;
            }
            index.add_manifest(manifest);
        }

        index.load_enum_definitions();
        debug!(
            "Indexed {} declarations in {} packages",
            index.declarations.len(),
            index.packages.len()
        );
        index
    }

    fn add_manifest(&mut self, manifest: &PackageManifest) {
        let package = manifest.path.clone();
        let package_name = manifest.package_name().to_string();
        self.packages
            .insert(package.clone(), package_name.clone());

        for spec in &manifest.types {
            self.insert(Declaration::Type(TypeDeclaration {
                package: package.clone(),
                package_name: package_name.clone(),
                spec: spec.clone(),
                enums: Vec::new(),
            }));
        }
        for spec in &manifest.funcs {
            self.insert(Declaration::Function(FunctionDeclaration {
                package: package.clone(),
                package_name: package_name.clone(),
                spec: spec.clone(),
            }));
        }
        for group in &manifest.consts {
            if group.items.is_empty() {
                continue;
            }
            let decl = Declaration::ConstGroup(ConstGroupDeclaration {
                package: package.clone(),
                package_name: package_name.clone(),
                group: group.clone(),
            });
            self.const_groups.push(decl.key());
            self.insert(decl);
        }
    }

    pub fn insert(&mut self, decl: Declaration) {
        let key = decl.key();
        if self.declarations.contains_key(&key) {
            debug!("Duplicate declaration {}, keeping the last one", key);
        }
        self.declarations.insert(key, decl);
    }

    pub fn lookup(&self, key: &str) -> Option<&Declaration> {
        self.declarations.get(key)
    }

    pub fn lookup_type(&self, package: &str, name: &str) -> Option<&TypeDeclaration> {
        match self.lookup(&format!("{}.{}", package, name)) {
            Some(Declaration::Type(t)) => Some(t),
            _ => None,
        }
    }

    pub fn lookup_function(&self, key: &str) -> Option<&FunctionDeclaration> {
        match self.lookup(key) {
            Some(Declaration::Function(f)) => Some(f),
            _ => None,
        }
    }

    pub fn package_name(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Turn typed constant groups into enum items on their named types.
    fn load_enum_definitions(&mut self) {
        let mut contributions: Vec<(String, EnumItem)> = Vec::new();

        for group_key in &self.const_groups {
            let decl = match self.declarations.get(group_key) {
                Some(Declaration::ConstGroup(c)) => c,
                _ => continue,
            };

            let mut current_type: Option<&TypeExpr> = None;
            for item in &decl.group.items {
                if item.ty.is_some() {
                    current_type = item.ty.as_ref();
                }

                let (package, name) = match current_type {
                    Some(TypeExpr::Named { package, name, .. }) => {
                        (package.as_deref().unwrap_or(&decl.package), name)
                    }
                    _ => continue,
                };

                if package != decl.package {
                    debug!(
                        "Constant {}.{} has type from package {}, not contributing an enum item",
                        decl.package, item.name, package
                    );
                    continue;
                }

                let type_key = format!("{}.{}", package, name);
                if !matches!(self.declarations.get(&type_key), Some(Declaration::Type(_))) {
                    debug!("Constant {} has unresolved type {}", item.name, type_key);
                    continue;
                }

                contributions.push((
                    type_key,
                    EnumItem {
                        key: item.name.clone(),
                        value: item.value.to_json(),
                        description: Comment::parse(&item.doc).description(),
                    },
                ));
            }
        }

        for (type_key, item) in contributions {
            if let Some(Declaration::Type(t)) = self.declarations.get_mut(&type_key) {
                t.enums.push(item);
            }
        }
    }
}
