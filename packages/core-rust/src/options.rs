//! Directive-block option collection.
//!
//! Hosts configure the gateway through a nested directive block:
//!
//! ```text
//! anycable {
//!     log_level debug
//!     redis_url redis://localhost:6379/5
//! }
//! ```
//!
//! Each inner line carries exactly one key and one value and becomes one
//! `--key=value` entry, in input order, ready to feed the gateway's own
//! flag parsing. Collection is all-or-nothing: the first malformed line
//! fails the whole block.

use thiserror::Error;

/// Ordered `--name=value` option strings produced by [`collect`].
pub type OptionList = Vec<String>;

/// Errors from collecting options out of a directive block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// A key had no value token on its line.
    #[error("expected a value for option {key}, but none was provided")]
    MissingValue {
        /// The key missing its value.
        key: String,
    },
    /// A key had more than one value token on its line.
    #[error("expected a single value for option {key}")]
    TooManyValues {
        /// The key with surplus values.
        key: String,
    },
    /// The input held no directive name at all.
    #[error("missing directive name before the options block")]
    MissingDirective,
    /// The directive name was not followed by `{` on the same line.
    #[error("expected '{{' after directive {directive} to open the options block")]
    MissingBlock {
        /// The directive that lacks a block.
        directive: String,
    },
    /// A second `{` appeared inside the block.
    #[error("nested blocks are not supported in the options block")]
    NestedBlock,
    /// A quoted token never closed.
    #[error("unterminated quoted token")]
    UnterminatedQuote,
    /// The block never closed.
    #[error("options block is missing its closing '}}'")]
    UnterminatedBlock,
    /// Content followed the closing `}`.
    #[error("unexpected token {token} after the closing '}}'")]
    TrailingToken {
        /// The stray token.
        token: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    OpenBrace,
    CloseBrace,
    Newline,
}

/// Splits the block into words, braces and line breaks.
///
/// Tokens are whitespace-separated. A double-quoted token may contain
/// whitespace (quotes stripped, no escape processing), and `#` at the
/// start of a token comments out the rest of the line. `{` and `}` are
/// recognized only as standalone tokens.
fn lex(input: &str) -> Result<Vec<Token>, OptionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch == '\n' {
            chars.next();
            tokens.push(Token::Newline);
        } else if ch.is_whitespace() {
            chars.next();
        } else if ch == '#' {
            while let Some(&ch) = chars.peek() {
                if ch == '\n' {
                    break;
                }
                chars.next();
            }
        } else if ch == '"' {
            chars.next();
            let mut word = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => word.push(ch),
                    None => return Err(OptionError::UnterminatedQuote),
                }
            }
            tokens.push(Token::Word(word));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                chars.next();
                word.push(ch);
            }
            tokens.push(match word.as_str() {
                "{" => Token::OpenBrace,
                "}" => Token::CloseBrace,
                _ => Token::Word(word),
            });
        }
    }

    Ok(tokens)
}

/// Collects gateway options from a directive block.
///
/// Returns one `--key=value` entry per key/value line, in input order.
/// Duplicate keys are preserved as separate entries; resolving them is
/// the option consumer's business.
///
/// # Errors
///
/// Returns [`OptionError::MissingValue`] or [`OptionError::TooManyValues`]
/// naming the offending key when a line does not hold exactly one key and
/// one value, and a structural variant when the block itself is malformed.
/// No partial result survives an error.
pub fn collect(block: &str) -> Result<OptionList, OptionError> {
    let tokens = lex(block)?;
    let mut iter = tokens.into_iter();

    // The directive name precedes the block; leading blank lines are fine.
    let directive = loop {
        match iter.next() {
            Some(Token::Newline) => {}
            Some(Token::Word(name)) => break name,
            Some(Token::OpenBrace | Token::CloseBrace) | None => {
                return Err(OptionError::MissingDirective);
            }
        }
    };

    match iter.next() {
        Some(Token::OpenBrace) => {}
        _ => return Err(OptionError::MissingBlock { directive }),
    }

    let mut options = Vec::new();
    let mut line: Vec<String> = Vec::new();

    loop {
        match iter.next() {
            Some(Token::Word(word)) => line.push(word),
            Some(Token::Newline) => finish_line(&mut line, &mut options)?,
            Some(Token::OpenBrace) => return Err(OptionError::NestedBlock),
            Some(Token::CloseBrace) => {
                finish_line(&mut line, &mut options)?;
                break;
            }
            None => return Err(OptionError::UnterminatedBlock),
        }
    }

    for token in iter {
        match token {
            Token::Newline => {}
            Token::Word(word) => return Err(OptionError::TrailingToken { token: word }),
            Token::OpenBrace => {
                return Err(OptionError::TrailingToken {
                    token: "{".to_string(),
                });
            }
            Token::CloseBrace => {
                return Err(OptionError::TrailingToken {
                    token: "}".to_string(),
                });
            }
        }
    }

    Ok(options)
}

/// Converts one accumulated line into an option entry.
///
/// Blank lines are skipped; anything other than exactly one key and one
/// value fails.
fn finish_line(line: &mut Vec<String>, options: &mut Vec<String>) -> Result<(), OptionError> {
    if line.is_empty() {
        return Ok(());
    }
    let mut tokens = std::mem::take(line).into_iter();
    let key = tokens.next().unwrap_or_default();
    let Some(value) = tokens.next() else {
        return Err(OptionError::MissingValue { key });
    };
    if tokens.next().is_some() {
        return Err(OptionError::TooManyValues { key });
    }
    options.push(format!("--{key}={value}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn collects_configuration_block() {
        let block = "anycable {\n  log_level debug\n  redis_url redis://localhost:6379/5\n}";
        let options = collect(block).unwrap();
        assert_eq!(
            options,
            vec!["--log_level=debug", "--redis_url=redis://localhost:6379/5"]
        );
    }

    #[test]
    fn accepts_closing_brace_on_the_last_line() {
        let block = "anycable { log_level debug\nredis_url redis://localhost:6379/5 }";
        let options = collect(block).unwrap();
        assert_eq!(
            options,
            vec!["--log_level=debug", "--redis_url=redis://localhost:6379/5"]
        );
    }

    #[test]
    fn empty_block_yields_no_options() {
        assert_eq!(collect("anycable {\n}").unwrap(), Vec::<String>::new());
        assert_eq!(collect("anycable { }").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn preserves_duplicate_keys_in_order() {
        let block = "anycable {\n  path /cable\n  path /socket\n}";
        let options = collect(block).unwrap();
        assert_eq!(options, vec!["--path=/cable", "--path=/socket"]);
    }

    #[test]
    fn quoted_values_keep_whitespace() {
        let block = "anycable {\n  jwt_param \"token id\"\n}";
        let options = collect(block).unwrap();
        assert_eq!(options, vec!["--jwt_param=token id"]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let block = "anycable {\n  # tuned for staging\n\n  rpc_host localhost:50051\n}";
        let options = collect(block).unwrap();
        assert_eq!(options, vec!["--rpc_host=localhost:50051"]);
    }

    #[test]
    fn missing_value_names_the_key() {
        let block = "anycable {\n  log_level debug\n  redis_url\n}";
        let err = collect(block).unwrap_err();
        assert_eq!(
            err,
            OptionError::MissingValue {
                key: "redis_url".to_string()
            }
        );
    }

    #[test]
    fn too_many_values_names_the_key() {
        let block = "anycable {\n  path /cable /socket\n}";
        let err = collect(block).unwrap_err();
        assert_eq!(
            err,
            OptionError::TooManyValues {
                key: "path".to_string()
            }
        );
    }

    #[test]
    fn rejects_directive_without_block() {
        assert_eq!(
            collect("anycable").unwrap_err(),
            OptionError::MissingBlock {
                directive: "anycable".to_string()
            }
        );
        assert_eq!(
            collect("anycable\n{ }").unwrap_err(),
            OptionError::MissingBlock {
                directive: "anycable".to_string()
            }
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(collect("").unwrap_err(), OptionError::MissingDirective);
        assert_eq!(collect("\n\n").unwrap_err(), OptionError::MissingDirective);
    }

    #[test]
    fn rejects_unterminated_block() {
        assert_eq!(
            collect("anycable {\n  sse true\n").unwrap_err(),
            OptionError::UnterminatedBlock
        );
    }

    #[test]
    fn rejects_nested_blocks() {
        assert_eq!(
            collect("anycable {\n  broker {\n}").unwrap_err(),
            OptionError::NestedBlock
        );
    }

    #[test]
    fn rejects_content_after_the_block() {
        assert_eq!(
            collect("anycable { }\nextra").unwrap_err(),
            OptionError::TrailingToken {
                token: "extra".to_string()
            }
        );
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert_eq!(
            collect("anycable {\n  secret \"abc\n}").unwrap_err(),
            OptionError::UnterminatedQuote
        );
    }

    #[test]
    fn error_messages_name_the_key() {
        let err = OptionError::MissingValue {
            key: "redis_url".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "expected a value for option redis_url, but none was provided"
        );
        let err = OptionError::TooManyValues {
            key: "path".to_string(),
        };
        assert_eq!(err.to_string(), "expected a single value for option path");
    }

    proptest! {
        #[test]
        fn collects_every_line_in_order(
            pairs in prop::collection::vec(("[a-z_]{1,10}", "[a-zA-Z0-9_:/.]{1,16}"), 0..12)
        ) {
            let mut block = String::from("anycable {\n");
            for (key, value) in &pairs {
                block.push_str(key);
                block.push(' ');
                block.push_str(value);
                block.push('\n');
            }
            block.push('}');

            let options = collect(&block).unwrap();
            prop_assert_eq!(options.len(), pairs.len());
            for (option, (key, value)) in options.iter().zip(&pairs) {
                prop_assert_eq!(option, &format!("--{key}={value}"));
            }
        }
    }
}
