use super::AnnotationError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Token classes recognised in an annotation line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Tag,
    String,
    Number,
    Bool,
    Whitespace,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    /// Token text with surrounding quotes removed for string tokens.
    pub fn value(&self) -> String {
        if self.kind == TokenKind::String && self.text.len() >= 2 {
            self.text[1..self.text.len() - 1].replace("\\\"", "\"")
        } else {
            self.text.clone()
        }
    }
}

// Tried in order, first match wins.
static PATTERNS: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    [
        (TokenKind::Tag, r"^@[a-zA-Z_]\w*"),
        (TokenKind::String, r#"^"(\\.|[^"\\])*""#),
        (TokenKind::Number, r"^[+-]?([0-9]*[.])?[0-9]+"),
        (TokenKind::Bool, r"(?i)^(true|false)\b"),
        (TokenKind::Whitespace, r"^\s+"),
        (TokenKind::Identifier, r"^\S+"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

/// Split an annotation line into tokens.
pub fn tokenize(code: &str) -> Result<Vec<Token>, AnnotationError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while cursor < code.len() {
        let rest = &code[cursor..];
        let matched = PATTERNS.iter().find_map(|(kind, re)| {
            re.find(rest)
                .filter(|m| !m.as_str().is_empty())
                .map(|m| (*kind, m.as_str()))
        });

        match matched {
            Some((kind, text)) => {
                tokens.push(Token {
                    kind,
                    text: text.to_string(),
                });
                cursor += text.len();
            }
            None => {
                return Err(AnnotationError::UnexpectedInput {
                    position: cursor,
                    rest: rest.to_string(),
                })
            }
        }
    }

    Ok(tokens)
}
