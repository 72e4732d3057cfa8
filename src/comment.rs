use crate::annotation::{self, Directive};
use crate::schema::Schema;
use log::debug;

/// A comment block: its plain text plus the annotations found in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    /// Non-annotation lines, trimmed and joined with newlines
    pub text: String,
    pub directives: Vec<Directive>,
}

impl Comment {
    /// Parse a block of comment lines. Malformed annotations are dropped.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut comment = Comment::default();
        let mut text = Vec::new();

        for line in lines {
            let line = line.as_ref();
            let line = line.strip_prefix("//").unwrap_or(line);
            match annotation::parse(line) {
                Ok(Some(directive)) => comment.directives.push(directive),
                Ok(None) => text.push(line.trim()),
                Err(e) => debug!("Dropping malformed annotation {:?}: {}", line, e),
            }
        }

        comment.text = text.join("\n").trim().to_string();
        comment
    }

    fn has(&self, wanted: &Directive) -> bool {
        self.directives.iter().any(|d| d == wanted)
    }

    pub fn required(&self) -> bool {
        self.has(&Directive::Required)
    }

    pub fn nullable(&self) -> bool {
        self.has(&Directive::Nullable)
    }

    pub fn deprecated(&self) -> bool {
        self.has(&Directive::Deprecated)
    }

    pub fn ignored(&self) -> bool {
        self.has(&Directive::Ignore)
    }

    pub fn tags(&self) -> Vec<String> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Tag(tag) => Some(tag.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn consumes(&self) -> Vec<String> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Consume(content_type) => Some(content_type.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn produces(&self) -> Vec<String> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Produce(content_type) => Some(content_type.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last `@summary`, if any
    pub fn summary(&self) -> Option<&str> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::Summary(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Last `@id`, if any
    pub fn id(&self) -> Option<&str> {
        self.directives.iter().rev().find_map(|d| match d {
            Directive::Id(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// `(name, scopes)` of every `@security` annotation
    pub fn security(&self) -> Vec<(String, Vec<String>)> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Security { name, params } => Some((name.clone(), params.clone())),
                _ => None,
            })
            .collect()
    }

    /// Unrecognised annotations with the given tag (case-insensitive).
    pub fn unresolved(&self, tag: &str) -> Vec<&[String]> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                Directive::Unresolved { tag: t, tokens } if t.eq_ignore_ascii_case(tag) => {
                    Some(tokens.as_slice())
                }
                _ => None,
            })
            .collect()
    }

    /// Free text plus any `@description` annotations.
    pub fn description(&self) -> String {
        let mut parts = Vec::new();
        if !self.text.is_empty() {
            parts.push(self.text.as_str());
        }
        for d in &self.directives {
            if let Directive::Description(text) = d {
                parts.push(text.as_str());
            }
        }
        parts.join("\n")
    }

    /// Text with a leading prefix (usually the declaration name) removed.
    pub fn trim_prefix(&self, prefix: &str) -> String {
        self.description()
            .strip_prefix(prefix)
            .map(str::trim_start)
            .map(str::to_string)
            .unwrap_or_else(|| self.description())
    }

    /// Write the comment's semantics onto a schema.
    ///
    /// A reference only receives the description; the referenced schema's own
    /// flags belong to its declaration.
    pub fn apply_to_schema(&self, schema: &mut Schema) {
        let description = self.description();

        if schema.is_ref() {
            if !description.is_empty() {
                schema.description = Some(description);
            }
            return;
        }

        if !description.is_empty() {
            schema.description = Some(description);
        }
        if self.deprecated() {
            schema.deprecated = true;
        }
        if self.nullable() {
            schema.nullable = true;
        }
    }
}
