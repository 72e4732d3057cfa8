use super::lexer::{tokenize, Token, TokenKind};
use super::{AnnotationError, Directive};

/// Parse one comment line.
///
/// Returns `Ok(None)` when the line is plain text (its first token is not a
/// tag), `Ok(Some(directive))` for an annotation and `Err` when the line is an
/// annotation that cannot be lexed or is missing a required argument.
pub fn parse(line: &str) -> Result<Option<Directive>, AnnotationError> {
    let text = line.strip_prefix("//").unwrap_or(line);
    let tokens = tokenize(text)?;
    Parser::new(&tokens).parse()
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse(&mut self) -> Result<Option<Directive>, AnnotationError> {
        let tag = match self.consume(TokenKind::Tag) {
            Some(tag) => tag,
            None => return Ok(None),
        };

        let directive = match tag.text.to_lowercase().as_str() {
            "@required" => Directive::Required,
            "@nullable" => Directive::Nullable,
            "@ignore" => Directive::Ignore,
            "@deprecated" => Directive::Deprecated,
            "@consume" => Directive::Consume(self.expect_identifier(&tag.text)?),
            "@produce" => Directive::Produce(self.expect_identifier(&tag.text)?),
            "@tag" | "@tags" => Directive::Tag(self.words().join(" ")),
            "@description" => Directive::Description(self.rest()),
            "@summary" => Directive::Summary(self.rest()),
            "@id" => Directive::Id(self.rest()),
            "@security" => {
                let name = self.expect_identifier(&tag.text)?;
                Directive::Security {
                    name,
                    params: self.words(),
                }
            }
            _ => Directive::Unresolved {
                tag: tag.text.clone(),
                tokens: self.tokens[self.position..]
                    .iter()
                    .filter(|t| t.kind != TokenKind::Whitespace)
                    .map(Token::value)
                    .collect(),
            },
        };

        Ok(Some(directive))
    }

    fn skip_whitespace(&mut self) {
        while self
            .lookahead()
            .map_or(false, |t| t.kind == TokenKind::Whitespace)
        {
            self.position += 1;
        }
    }

    fn lookahead(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// Consume the next non-whitespace token if it has the given kind.
    fn consume(&mut self, kind: TokenKind) -> Option<&'a Token> {
        self.skip_whitespace();
        let token = self.lookahead().filter(|t| t.kind == kind)?;
        self.position += 1;
        Some(token)
    }

    fn expect_identifier(&mut self, tag: &str) -> Result<String, AnnotationError> {
        self.consume(TokenKind::Identifier)
            .map(|t| t.text.clone())
            .ok_or_else(|| AnnotationError::MissingArgument {
                tag: tag.to_string(),
                expected: "identifier",
            })
    }

    /// All remaining non-whitespace tokens.
    fn words(&mut self) -> Vec<String> {
        let mut words = Vec::new();
        loop {
            self.skip_whitespace();
            match self.lookahead() {
                Some(token) => {
                    words.push(token.value());
                    self.position += 1;
                }
                None => break,
            }
        }
        words
    }

    /// Remaining raw text, trimmed.
    fn rest(&mut self) -> String {
        let text: String = self.tokens[self.position..]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        self.position = self.tokens.len();
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_consume_and_produce() {
        assert_eq!(
            parse("@consume application/json").unwrap(),
            Some(Directive::Consume("application/json".to_string()))
        );
        assert_eq!(
            parse("// @produce application/xml").unwrap(),
            Some(Directive::Produce("application/xml".to_string()))
        );
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        assert_eq!(parse(" @REQUIRED  ").unwrap(), Some(Directive::Required));
        assert_eq!(parse("@Ignore").unwrap(), Some(Directive::Ignore));
    }

    #[test]
    fn test_security_with_scopes() {
        assert_eq!(
            parse(" @security oauth2 pet:read pet:write").unwrap(),
            Some(Directive::Security {
                name: "oauth2".to_string(),
                params: vec!["pet:read".to_string(), "pet:write".to_string()],
            })
        );
    }

    #[test]
    fn test_security_without_name_is_error() {
        let err = parse("@security").unwrap_err();
        assert!(matches!(err, AnnotationError::MissingArgument { .. }));
    }

    #[test]
    fn test_consume_without_argument_is_error() {
        assert!(parse("@consume   ").is_err());
    }

    #[test]
    fn test_tags_joined_with_spaces() {
        assert_eq!(
            parse("@tags Shop Admin").unwrap(),
            Some(Directive::Tag("Shop Admin".to_string()))
        );
    }

    #[test]
    fn test_free_text_directives() {
        assert_eq!(
            parse("@summary List all  the users ").unwrap(),
            Some(Directive::Summary("List all  the users".to_string()))
        );
        assert_eq!(
            parse("@id listUsers").unwrap(),
            Some(Directive::Id("listUsers".to_string()))
        );
        assert_eq!(
            parse(r#"@description Price in "cents""#).unwrap(),
            Some(Directive::Description(r#"Price in "cents""#.to_string()))
        );
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        assert_eq!(
            parse(r#"@limit 10 "per page" true"#).unwrap(),
            Some(Directive::Unresolved {
                tag: "@limit".to_string(),
                tokens: vec![
                    "10".to_string(),
                    "per page".to_string(),
                    "true".to_string()
                ],
            })
        );
    }

    #[test]
    fn test_plain_text_is_not_a_directive() {
        assert_eq!(parse("User is a shop customer").unwrap(), None);
        assert_eq!(parse("email@example.com").unwrap(), None);
        assert_eq!(parse("").unwrap(), None);
    }
}
