//! A lightweight Go source scanner.
//!
//! This crate extracts the syntactic facts impact analysis needs from Go
//! source files without building a full AST:
//!
//! - **Tokenizing**: [`tokenize`] produces a line-annotated token stream,
//!   handling comments, interpreted and raw string literals, rune literals,
//!   and numeric literals.
//! - **File model**: [`GoFile::parse`] recognizes the package clause, the
//!   import table, top-level declarations with 1-based inclusive line
//!   ranges, interface method signatures, struct field types, and function
//!   signatures (parameter and result types).
//! - **Queries**: selector-expression and method-call scans over the whole
//!   file or restricted to a single named declaration, plus extraction of
//!   address-taken composite literals of a requested `pkg.Type`.
//!
//! The scanner is tolerant by construction: anything it does not recognize
//! is skipped, and only tokenizer-level problems (an unterminated string or
//! comment) surface as [`GosynError`].
//!
//! # Quick start
//!
//! ```
//! use impactor_gosyn::GoFile;
//!
//! let src = r#"
//! package gateway
//!
//! import "example.com/m/svc"
//!
//! func Handle() error {
//!     return svc.GetUser()
//! }
//! "#;
//! let file = GoFile::parse(src).expect("scan error");
//! assert_eq!(file.package, "gateway");
//! assert_eq!(file.resolve_alias("svc"), Some("example.com/m/svc"));
//! assert!(file.decl_named("Handle").is_some());
//! ```

mod file;
mod query;
mod token;

pub use file::{
    CompositeLit, Decl, DeclKind, GoFile, Import, InterfaceMethod, LitField, Signature, TypeRef,
};
pub use query::{method_calls_in, selector_pairs_in, MethodCall, SelectorPair};
pub use token::{tokenize, GosynError, Keyword, TokKind, Token};

/// Whether a Go identifier is exported (starts with an uppercase letter).
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_follows_first_char_case() {
        assert!(is_exported("GetUser"));
        assert!(is_exported("X"));
        assert!(!is_exported("getUser"));
        assert!(!is_exported("_hidden"));
        assert!(!is_exported(""));
    }
}
