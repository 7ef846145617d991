//! Token-level scans for symbol and method usage.
//!
//! These are the witness searches behind impact decisions: does this file
//! mention `alias.Symbol`, and does it call `something.Method(...)`? They
//! run over the whole token stream or over one declaration's token range.

use std::ops::Range;

use crate::token::{TokKind, Token};

/// A selector expression `base.selected` whose base is a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPair {
    pub base: String,
    pub selected: String,
    pub line: u32,
}

/// A call through a selector: `recv.name(...)`. The base is recorded when
/// the receiver is a plain identifier (e.g. a package alias); calls on
/// compound expressions (`foo().Close()`) carry no base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub base: Option<String>,
    pub name: String,
    pub line: u32,
}

/// Collect selector expressions in `range` whose base is an identifier.
///
/// For a chain `a.b.c` only `(a, b)` is reported, matching an AST selector
/// whose receiver is a bare identifier; `(b, c)` has a selector expression
/// as its receiver and is skipped.
pub fn selector_pairs_in(tokens: &[Token], range: Range<usize>) -> Vec<SelectorPair> {
    let mut out = Vec::new();
    let end = range.end.min(tokens.len());
    let mut i = range.start;
    while i + 2 < end {
        let matched = tokens[i].kind.ident().is_some()
            && tokens[i + 1].kind.is_punct('.')
            && tokens[i + 2].kind.ident().is_some()
            && (i == 0 || !tokens[i - 1].kind.is_punct('.'));
        if matched {
            out.push(SelectorPair {
                base: tokens[i].kind.ident().unwrap_or_default().to_string(),
                selected: tokens[i + 2].kind.ident().unwrap_or_default().to_string(),
                line: tokens[i].line,
            });
        }
        i += 1;
    }
    out
}

/// Collect calls through selectors (`x.Method(...)`) in `range`.
pub fn method_calls_in(tokens: &[Token], range: Range<usize>) -> Vec<MethodCall> {
    let mut out = Vec::new();
    let end = range.end.min(tokens.len());
    let mut i = range.start;
    while i + 2 < end {
        let matched = tokens[i].kind.is_punct('.')
            && tokens[i + 1].kind.ident().is_some()
            && tokens[i + 2].kind.is_punct('(');
        if matched {
            let base = if i >= 1 {
                match tokens[i - 1].kind.ident() {
                    Some(b) if i < 2 || !tokens[i - 2].kind.is_punct('.') => Some(b.to_string()),
                    _ => None,
                }
            } else {
                None
            };
            out.push(MethodCall {
                base,
                name: tokens[i + 1].kind.ident().unwrap_or_default().to_string(),
                line: tokens[i + 1].line,
            });
        }
        i += 1;
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn toks(src: &str) -> Vec<Token> {
        tokenize(src).unwrap()
    }

    fn all_selectors(src: &str) -> Vec<(String, String)> {
        let t = toks(src);
        selector_pairs_in(&t, 0..t.len())
            .into_iter()
            .map(|p| (p.base, p.selected))
            .collect()
    }

    fn all_calls(src: &str) -> Vec<(Option<String>, String)> {
        let t = toks(src);
        method_calls_in(&t, 0..t.len())
            .into_iter()
            .map(|c| (c.base, c.name))
            .collect()
    }

    mod selectors {
        use super::*;

        #[test]
        fn simple_selector() {
            assert_eq!(
                all_selectors("svc.GetUser()"),
                vec![("svc".to_string(), "GetUser".to_string())]
            );
        }

        #[test]
        fn chained_selector_reports_only_ident_base() {
            assert_eq!(
                all_selectors("cfg.DB.Host"),
                vec![("cfg".to_string(), "DB".to_string())]
            );
        }

        #[test]
        fn call_result_selector_has_no_ident_base() {
            assert_eq!(all_selectors("build().Close"), Vec::<(String, String)>::new());
        }

        #[test]
        fn type_reference_counts_as_use() {
            assert_eq!(
                all_selectors("var x sqlc.Row"),
                vec![("sqlc".to_string(), "Row".to_string())]
            );
        }

        #[test]
        fn variadic_dots_do_not_pair() {
            assert_eq!(
                all_selectors("func f(args ...string) {}"),
                Vec::<(String, String)>::new()
            );
        }
    }

    mod method_calls {
        use super::*;

        #[test]
        fn qualified_call_carries_base() {
            assert_eq!(
                all_calls("svc.GetUser(ctx)"),
                vec![(Some("svc".to_string()), "GetUser".to_string())]
            );
        }

        #[test]
        fn receiver_call_carries_base_ident() {
            assert_eq!(
                all_calls("client.Fetch(ctx)"),
                vec![(Some("client".to_string()), "Fetch".to_string())]
            );
        }

        #[test]
        fn chained_call_base_is_not_an_ident() {
            // h.client.Fetch(ctx): Fetch's receiver is a selector, so the
            // call is reported without a base.
            let calls = all_calls("h.client.Fetch(ctx)");
            assert_eq!(calls, vec![(None, "Fetch".to_string())]);
        }

        #[test]
        fn field_access_is_not_a_call() {
            assert_eq!(all_calls("x := h.client"), Vec::<(Option<String>, String)>::new());
        }

        #[test]
        fn restricted_range_sees_only_its_slice() {
            let t = toks("a.One()\nb.Two()");
            // Only the first statement's tokens.
            let calls = method_calls_in(&t, 0..4);
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].name, "One");
        }
    }
}
