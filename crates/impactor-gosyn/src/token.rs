//! Tokenizer for Go source code.
//!
//! Produces a flat stream of line-annotated tokens. Comments are discarded;
//! string and rune literals are collapsed into single tokens so downstream
//! scans never mistake their contents for code. Newlines are not tokens, but
//! every token carries its 1-based line, which is how the parser applies
//! Go's semicolon-insertion rule.

use thiserror::Error;

/// Tokenizer-level error. Anything else is tolerated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GosynError {
    #[error("unterminated string literal at line {line}")]
    UnterminatedString { line: u32 },

    #[error("unterminated block comment at line {line}")]
    UnterminatedComment { line: u32 },

    #[error("unterminated rune literal at line {line}")]
    UnterminatedRune { line: u32 },
}

/// Go's reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        Some(match word {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "chan" => Keyword::Chan,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "default" => Keyword::Default,
            "defer" => Keyword::Defer,
            "else" => Keyword::Else,
            "fallthrough" => Keyword::Fallthrough,
            "for" => Keyword::For,
            "func" => Keyword::Func,
            "go" => Keyword::Go,
            "goto" => Keyword::Goto,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "interface" => Keyword::Interface,
            "map" => Keyword::Map,
            "package" => Keyword::Package,
            "range" => Keyword::Range,
            "return" => Keyword::Return,
            "select" => Keyword::Select,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "type" => Keyword::Type,
            "var" => Keyword::Var,
            _ => return None,
        })
    }
}

/// Token kinds. Operators and delimiters are single-character `Punct`s;
/// multi-character operators arrive as consecutive puncts, which is all the
/// pattern scans need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokKind {
    Ident(String),
    Keyword(Keyword),
    /// Interpreted or raw string literal, with quotes removed and common
    /// escapes decoded.
    Str(String),
    /// Rune literal; the content is irrelevant to analysis.
    Rune,
    /// Numeric literal; the value is irrelevant to analysis.
    Number,
    Punct(char),
}

impl TokKind {
    /// The identifier text, if this is an identifier.
    pub fn ident(&self) -> Option<&str> {
        match self {
            TokKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, TokKind::Punct(p) if *p == c)
    }
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokKind,
    pub line: u32,
}

/// Whether Go would insert a semicolon after this token at a line break.
/// This is the rule the parser uses to find the end of a declaration.
pub(crate) fn ends_statement(kind: &TokKind) -> bool {
    matches!(
        kind,
        TokKind::Ident(_)
            | TokKind::Str(_)
            | TokKind::Rune
            | TokKind::Number
            | TokKind::Punct(')')
            | TokKind::Punct(']')
            | TokKind::Punct('}')
            | TokKind::Keyword(
                Keyword::Return | Keyword::Break | Keyword::Continue | Keyword::Fallthrough
            )
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize Go source.
pub fn tokenize(src: &str) -> Result<Vec<Token>, GosynError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => {
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let start_line = line;
                i += 2;
                loop {
                    if i >= chars.len() {
                        return Err(GosynError::UnterminatedComment { line: start_line });
                    }
                    if chars[i] == '\n' {
                        line += 1;
                        i += 1;
                    } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        break;
                    } else {
                        i += 1;
                    }
                }
            }
            '"' => {
                let start_line = line;
                i += 1;
                let mut value = String::new();
                loop {
                    match chars.get(i) {
                        None | Some('\n') => {
                            return Err(GosynError::UnterminatedString { line: start_line });
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            // Decode the escapes that matter for names and
                            // paths; pass anything exotic through verbatim.
                            match chars.get(i + 1) {
                                Some('n') => value.push('\n'),
                                Some('t') => value.push('\t'),
                                Some('\\') => value.push('\\'),
                                Some('"') => value.push('"'),
                                Some('\'') => value.push('\''),
                                Some(other) => {
                                    value.push('\\');
                                    value.push(*other);
                                }
                                None => {
                                    return Err(GosynError::UnterminatedString {
                                        line: start_line,
                                    });
                                }
                            }
                            i += 2;
                        }
                        Some(ch) => {
                            value.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Str(value),
                    line: start_line,
                });
            }
            '`' => {
                let start_line = line;
                i += 1;
                let mut value = String::new();
                loop {
                    match chars.get(i) {
                        None => return Err(GosynError::UnterminatedString { line: start_line }),
                        Some('`') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            if *ch == '\n' {
                                line += 1;
                            }
                            value.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Str(value),
                    line: start_line,
                });
            }
            '\'' => {
                let start_line = line;
                i += 1;
                loop {
                    match chars.get(i) {
                        None | Some('\n') => {
                            return Err(GosynError::UnterminatedRune { line: start_line });
                        }
                        Some('\\') => {
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(_) => {
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Rune,
                    line: start_line,
                });
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let kind = match Keyword::lookup(&word) {
                    Some(kw) => TokKind::Keyword(kw),
                    None => TokKind::Ident(word),
                };
                tokens.push(Token { kind, line });
            }
            c if c.is_ascii_digit() => {
                // Consume the literal, including hex/exponent forms and a
                // fractional part. `1.Method` is not valid Go, so eating the
                // dot after a digit never swallows a selector.
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                        i += 1;
                    } else if (ch == '+' || ch == '-')
                        && matches!(chars.get(i - 1), Some('e') | Some('E'))
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Number,
                    line,
                });
            }
            other => {
                tokens.push(Token {
                    kind: TokKind::Punct(other),
                    line,
                });
                i += 1;
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_package_clause() {
        assert_eq!(
            kinds("package main"),
            vec![
                TokKind::Keyword(Keyword::Package),
                TokKind::Ident("main".to_string())
            ]
        );
    }

    #[test]
    fn tracks_lines() {
        let toks = tokenize("package a\n\nfunc F() {\n}\n").unwrap();
        let func_tok = toks
            .iter()
            .find(|t| t.kind == TokKind::Keyword(Keyword::Func))
            .unwrap();
        assert_eq!(func_tok.line, 3);
        let close = toks.iter().rfind(|t| t.kind.is_punct('}')).unwrap();
        assert_eq!(close.line, 4);
    }

    #[test]
    fn discards_line_and_block_comments() {
        let toks = kinds("// heading\nx /* mid */ y");
        assert_eq!(
            toks,
            vec![
                TokKind::Ident("x".to_string()),
                TokKind::Ident("y".to_string())
            ]
        );
    }

    #[test]
    fn block_comment_advances_lines() {
        let toks = tokenize("/* a\nb\nc */ x").unwrap();
        assert_eq!(toks[0].line, 3);
    }

    #[test]
    fn decodes_interpreted_strings() {
        assert_eq!(
            kinds(r#""serve [flags]""#),
            vec![TokKind::Str("serve [flags]".to_string())]
        );
        assert_eq!(
            kinds(r#""a\"b""#),
            vec![TokKind::Str("a\"b".to_string())]
        );
    }

    #[test]
    fn raw_strings_keep_content_and_count_lines() {
        let toks = tokenize("`line1\nline2` x").unwrap();
        assert_eq!(toks[0].kind, TokKind::Str("line1\nline2".to_string()));
        assert_eq!(toks[1].line, 2);
    }

    #[test]
    fn selector_in_string_is_not_code() {
        let toks = kinds(r#"x := "svc.GetUser""#);
        assert!(toks.iter().all(|t| !matches!(t, TokKind::Ident(n) if n == "GetUser")));
    }

    #[test]
    fn rune_literals_including_escaped_quote() {
        assert_eq!(kinds(r"'\''"), vec![TokKind::Rune]);
        assert_eq!(kinds("'x'"), vec![TokKind::Rune]);
    }

    #[test]
    fn numbers_do_not_split_on_dots() {
        assert_eq!(kinds("1.5"), vec![TokKind::Number]);
        assert_eq!(kinds("0x1F"), vec![TokKind::Number]);
        assert_eq!(kinds("1e-9"), vec![TokKind::Number]);
    }

    #[test]
    fn selector_tokens() {
        assert_eq!(
            kinds("svc.GetUser()"),
            vec![
                TokKind::Ident("svc".to_string()),
                TokKind::Punct('.'),
                TokKind::Ident("GetUser".to_string()),
                TokKind::Punct('('),
                TokKind::Punct(')'),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            tokenize("x := \"abc"),
            Err(GosynError::UnterminatedString { line: 1 })
        );
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert_eq!(
            tokenize("/* never closed"),
            Err(GosynError::UnterminatedComment { line: 1 })
        );
    }

    #[test]
    fn unicode_identifiers() {
        assert_eq!(
            kinds("日本語 := 1"),
            vec![
                TokKind::Ident("日本語".to_string()),
                TokKind::Punct(':'),
                TokKind::Punct('='),
                TokKind::Number,
            ]
        );
    }
}
