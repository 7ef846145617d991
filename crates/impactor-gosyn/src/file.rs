//! Per-file syntactic model for Go source.
//!
//! [`GoFile::parse`] walks the token stream once and records the facts the
//! analysis passes ask about: the package clause, the import table,
//! top-level declaration line ranges, interface method signatures, struct
//! field types, and function signatures. Statement boundaries are found with
//! Go's semicolon-insertion rule (a line break ends a declaration when the
//! previous token could end a statement), so multi-line declarations keep
//! their full range without a grammar.

use std::collections::HashMap;
use std::ops::Range;

use crate::token::{ends_statement, tokenize, GosynError, Keyword, TokKind, Token};
use crate::{is_exported, query};

// ============================================================================
// Model
// ============================================================================

/// One import declaration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Explicit alias, including `_` and `.` when written; `None` when the
    /// import has no alias clause.
    pub alias: Option<String>,
    pub path: String,
}

/// Top-level declaration kinds tracked by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// A function or method.
    Func,
    /// A type declaration.
    Type,
    /// A `var` or `const` name.
    Value,
}

/// A top-level declaration with its 1-based inclusive line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    pub exported: bool,
    pub start_line: u32,
    pub end_line: u32,
    /// Token range of the declaration, for restricted scans.
    pub tokens: Range<usize>,
}

/// One method signature inside an exported interface declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    pub interface_name: String,
    pub method_name: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A pointer-peeled, possibly package-qualified type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// The package qualifier (`pkg` in `pkg.Type`), when present.
    pub qualifier: Option<String>,
    pub name: String,
}

/// Parameter and result types of a top-level function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub results: Vec<TypeRef>,
}

/// One `Key: value` entry of a composite literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LitField {
    pub key: String,
    /// The decoded literal when the value is a single string.
    pub string_value: Option<String>,
    /// Token range of the value expression.
    pub tokens: Range<usize>,
}

/// An address-taken composite literal (`&pkg.Type{...}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    pub line: u32,
    pub fields: Vec<LitField>,
}

impl CompositeLit {
    /// The string value of a field, if present.
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| f.string_value.as_deref())
    }

    /// The value token range of a field, if present.
    pub fn field_tokens(&self, key: &str) -> Option<Range<usize>> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.tokens.clone())
    }
}

/// The scanned facts of one Go source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    pub package: String,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub interface_methods: Vec<InterfaceMethod>,
    /// Types of every struct field declared at the top level of the file.
    pub struct_field_types: Vec<TypeRef>,
    /// Signatures of every top-level function and method.
    pub signatures: Vec<Signature>,
    tokens: Vec<Token>,
}

impl GoFile {
    /// Scan a Go source file.
    pub fn parse(src: &str) -> Result<GoFile, GosynError> {
        let tokens = tokenize(src)?;
        Ok(Parser::new(tokens).run())
    }

    /// The raw token stream.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// First declaration with the given name, if any.
    pub fn decl_named(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Names of all exported top-level declarations, in source order.
    pub fn exported_decl_names(&self) -> Vec<&str> {
        self.decls
            .iter()
            .filter(|d| d.exported)
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Alias-to-path map per the command-extractor resolution rule: an
    /// explicit alias wins, `_` and `.` contribute nothing, and an
    /// unaliased import uses its trailing path segment unless that segment
    /// contains a hyphen.
    pub fn import_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for imp in &self.imports {
            let alias = match &imp.alias {
                Some(a) if a == "_" || a == "." => continue,
                Some(a) => a.clone(),
                None => {
                    let segment = imp.path.rsplit('/').next().unwrap_or(&imp.path);
                    if segment.contains('-') {
                        continue;
                    }
                    segment.to_string()
                }
            };
            map.insert(alias, imp.path.clone());
        }
        map
    }

    /// The identifier this file refers to `target_path` by, or `None` when
    /// the file does not import it usably (not imported, blank import, or
    /// dot import).
    pub fn alias_for(&self, target_path: &str) -> Option<String> {
        let imp = self.imports.iter().find(|i| i.path == target_path)?;
        match &imp.alias {
            Some(a) if a == "_" || a == "." => None,
            Some(a) => Some(a.clone()),
            None => Some(
                target_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(target_path)
                    .to_string(),
            ),
        }
    }

    /// The import path an alias resolves to, if any.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        for imp in &self.imports {
            let matches = match &imp.alias {
                Some(a) if a == "_" || a == "." => false,
                Some(a) => a == alias,
                None => {
                    let segment = imp.path.rsplit('/').next().unwrap_or(&imp.path);
                    !segment.contains('-') && segment == alias
                }
            };
            if matches {
                return Some(&imp.path);
            }
        }
        None
    }

    /// Address-taken composite literals of type `pkg.type_name`.
    pub fn composite_literals(&self, pkg: &str, type_name: &str) -> Vec<CompositeLit> {
        let t = &self.tokens;
        let mut out = Vec::new();
        let mut i = 0;
        while i + 4 < t.len() {
            let is_match = t[i].kind.is_punct('&')
                && t[i + 1].kind.ident() == Some(pkg)
                && t[i + 2].kind.is_punct('.')
                && t[i + 3].kind.ident() == Some(type_name)
                && t[i + 4].kind.is_punct('{');
            if is_match {
                let close = find_matching(t, i + 4, '{', '}');
                out.push(parse_composite_body(t, i + 4, close, t[i].line));
                i = close + 1;
            } else {
                i += 1;
            }
        }
        out
    }

    /// Whether any selector `alias.X` with `X` in `names` appears anywhere
    /// in the file.
    pub fn has_selector_use(&self, alias: &str, names: &[String]) -> bool {
        query::selector_pairs_in(&self.tokens, 0..self.tokens.len())
            .iter()
            .any(|p| p.base == alias && names.iter().any(|n| n == &p.selected))
    }
}

// ============================================================================
// Composite literal body
// ============================================================================

fn parse_composite_body(
    tokens: &[Token],
    open_idx: usize,
    close_idx: usize,
    line: u32,
) -> CompositeLit {
    let mut fields = Vec::new();
    let mut pos = open_idx + 1;
    while pos < close_idx {
        let is_field = tokens[pos].kind.ident().is_some()
            && pos + 1 < close_idx
            && tokens[pos + 1].kind.is_punct(':');
        if !is_field {
            pos += 1;
            continue;
        }
        let key = tokens[pos].kind.ident().unwrap_or_default().to_string();
        let val_start = pos + 2;
        let mut p = val_start;
        let mut depth = 0i32;
        while p < close_idx {
            match &tokens[p].kind {
                TokKind::Punct('(') | TokKind::Punct('[') | TokKind::Punct('{') => depth += 1,
                TokKind::Punct(')') | TokKind::Punct(']') | TokKind::Punct('}') => depth -= 1,
                TokKind::Punct(',') if depth == 0 => break,
                _ => {}
            }
            p += 1;
        }
        let string_value = match tokens.get(val_start) {
            Some(tok) if val_start < p => match &tok.kind {
                // A bare string literal value; concatenations and calls
                // contribute no string value.
                TokKind::Str(s) if p == val_start + 1 => Some(s.clone()),
                _ => None,
            },
            _ => None,
        };
        fields.push(LitField {
            key,
            string_value,
            tokens: val_start..p,
        });
        pos = p + 1;
    }
    CompositeLit { line, fields }
}

/// Index of the token closing the bracket at `open_idx`. Tolerant: an
/// unbalanced file yields the last token index.
fn find_matching(tokens: &[Token], open_idx: usize, open: char, close: char) -> usize {
    let mut depth = 0i32;
    for (i, tok) in tokens.iter().enumerate().skip(open_idx) {
        if tok.kind.is_punct(open) {
            depth += 1;
        } else if tok.kind.is_punct(close) {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    tokens.len().saturating_sub(1)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    package: String,
    imports: Vec<Import>,
    decls: Vec<Decl>,
    interface_methods: Vec<InterfaceMethod>,
    struct_field_types: Vec<TypeRef>,
    signatures: Vec<Signature>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            package: String::new(),
            imports: Vec::new(),
            decls: Vec::new(),
            interface_methods: Vec::new(),
            struct_field_types: Vec::new(),
            signatures: Vec::new(),
        }
    }

    fn run(mut self) -> GoFile {
        while self.pos < self.tokens.len() {
            match self.tokens[self.pos].kind.clone() {
                TokKind::Keyword(Keyword::Package) => {
                    self.pos += 1;
                    if let Some(name) = self.current_ident() {
                        self.package = name;
                        self.pos += 1;
                    }
                }
                TokKind::Keyword(Keyword::Import) => self.parse_import(),
                TokKind::Keyword(Keyword::Func) => self.parse_func(),
                TokKind::Keyword(Keyword::Type) => self.parse_type_decl(),
                TokKind::Keyword(Keyword::Var) | TokKind::Keyword(Keyword::Const) => {
                    self.parse_value_decl()
                }
                _ => self.pos += 1,
            }
        }
        GoFile {
            package: self.package,
            imports: self.imports,
            decls: self.decls,
            interface_methods: self.interface_methods,
            struct_field_types: self.struct_field_types,
            signatures: self.signatures,
            tokens: self.tokens,
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_ident(&self) -> Option<String> {
        self.current().and_then(|t| t.kind.ident()).map(String::from)
    }

    fn current_is_punct(&self, c: char) -> bool {
        self.current().is_some_and(|t| t.kind.is_punct(c))
    }

    fn skip_balanced(&mut self, open: char, close: char) {
        let end = find_matching(&self.tokens, self.pos, open, close);
        self.pos = end + 1;
    }

    /// Token range inside the bracket at the current position; leaves the
    /// cursor past the closing bracket.
    fn balanced_range(&mut self, open: char, close: char) -> Range<usize> {
        let start = self.pos + 1;
        let end = find_matching(&self.tokens, self.pos, open, close);
        self.pos = end + 1;
        start..end
    }

    /// Whether a statement boundary (inserted semicolon) sits between the
    /// previous token and the current one.
    fn at_statement_boundary(&self) -> bool {
        if self.pos == 0 {
            return false;
        }
        match (self.tokens.get(self.pos - 1), self.current()) {
            (Some(prev), Some(cur)) => cur.line > prev.line && ends_statement(&prev.kind),
            _ => true,
        }
    }

    fn last_line(&self) -> u32 {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.line)
            .unwrap_or(1)
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    fn parse_import(&mut self) {
        self.pos += 1; // import
        if self.current_is_punct('(') {
            let range = self.balanced_range('(', ')');
            let mut p = range.start;
            while p < range.end {
                p = self.parse_import_entry_at(p, range.end);
            }
        } else {
            let end = self.tokens.len();
            self.pos = self.parse_import_entry_at(self.pos, end);
        }
    }

    /// Parse one `[alias] "path"` entry starting at `p`; returns the index
    /// after the entry (or `p + 1` when nothing was recognized).
    fn parse_import_entry_at(&mut self, p: usize, limit: usize) -> usize {
        let mut i = p;
        let mut alias: Option<String> = None;
        match &self.tokens[i].kind {
            TokKind::Ident(name) => {
                alias = Some(name.clone());
                i += 1;
            }
            TokKind::Punct('.') => {
                alias = Some(".".to_string());
                i += 1;
            }
            _ => {}
        }
        let path = match self.tokens.get(i).map(|t| &t.kind) {
            Some(TokKind::Str(path)) if i < limit => Some(path.clone()),
            _ => None,
        };
        if let Some(path) = path {
            self.imports.push(Import { alias, path });
            return i + 1;
        }
        p + 1
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    fn parse_func(&mut self) {
        let start_idx = self.pos;
        let start_line = self.tokens[start_idx].line;
        self.pos += 1; // func

        if self.current_is_punct('(') {
            self.skip_balanced('(', ')'); // receiver
        }
        let name = match self.current_ident() {
            Some(n) => n,
            // A stray func literal; nothing to record.
            None => return,
        };
        self.pos += 1;

        if self.current_is_punct('[') {
            self.skip_balanced('[', ']'); // type parameters
        }
        if !self.current_is_punct('(') {
            return;
        }
        let params = self.balanced_range('(', ')');
        let results = self.parse_results();

        if self.current_is_punct('{') {
            self.skip_balanced('{', '}');
        }
        let end_line = self.last_line();

        let exported = is_exported(&name);
        self.decls.push(Decl {
            name: name.clone(),
            kind: DeclKind::Func,
            exported,
            start_line,
            end_line,
            tokens: start_idx..self.pos,
        });
        let params = self.extract_type_refs(params);
        let results = self.extract_type_refs(results);
        self.signatures.push(Signature {
            name,
            params,
            results,
        });
    }

    /// Consume a result list after the parameter parens: either a
    /// parenthesized group or a bare type expression running to the body
    /// brace (or a statement boundary for bodiless declarations).
    fn parse_results(&mut self) -> Range<usize> {
        if self.current_is_punct('(') {
            return self.balanced_range('(', ')');
        }
        let start = self.pos;
        while self.pos < self.tokens.len() {
            if self.at_statement_boundary() {
                break;
            }
            match &self.tokens[self.pos].kind {
                TokKind::Punct('{') => {
                    // An anonymous struct/interface result keeps its braces;
                    // anything else is the function body.
                    let after_composite = self.pos > start
                        && matches!(
                            self.tokens[self.pos - 1].kind,
                            TokKind::Keyword(Keyword::Struct) | TokKind::Keyword(Keyword::Interface)
                        );
                    if after_composite {
                        self.skip_balanced('{', '}');
                    } else {
                        break;
                    }
                }
                TokKind::Punct('(') => self.skip_balanced('(', ')'),
                TokKind::Punct('[') => self.skip_balanced('[', ']'),
                _ => self.pos += 1,
            }
        }
        start..self.pos
    }

    /// Split a parameter/result/field token range on top-level commas and
    /// extract a type reference from each fragment.
    fn extract_type_refs(&self, range: Range<usize>) -> Vec<TypeRef> {
        let mut refs = Vec::new();
        let mut frag_start = range.start;
        let mut depth = 0i32;
        for i in range.clone() {
            match &self.tokens[i].kind {
                TokKind::Punct('(') | TokKind::Punct('[') | TokKind::Punct('{') => depth += 1,
                TokKind::Punct(')') | TokKind::Punct(']') | TokKind::Punct('}') => depth -= 1,
                TokKind::Punct(',') if depth == 0 => {
                    if let Some(r) = extract_type_ref(&self.tokens[frag_start..i]) {
                        refs.push(r);
                    }
                    frag_start = i + 1;
                }
                _ => {}
            }
        }
        if frag_start < range.end {
            if let Some(r) = extract_type_ref(&self.tokens[frag_start..range.end]) {
                refs.push(r);
            }
        }
        refs
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type_decl(&mut self) {
        let kw_line = self.tokens[self.pos].line;
        self.pos += 1; // type
        if self.current_is_punct('(') {
            let close = find_matching(&self.tokens, self.pos, '(', ')');
            let block_end_line = self.tokens[close].line;
            self.pos += 1;
            while self.pos < close {
                if self.current_ident().is_some() {
                    // Every spec in a grouped declaration carries the block's
                    // full line range.
                    self.parse_type_spec(kw_line, Some(block_end_line), close);
                } else {
                    self.pos += 1;
                }
            }
            self.pos = close + 1;
        } else if self.current_ident().is_some() {
            let limit = self.tokens.len();
            self.parse_type_spec(kw_line, None, limit);
        }
    }

    fn parse_type_spec(&mut self, start_line: u32, block_end_line: Option<u32>, limit: usize) {
        let spec_start = self.pos;
        let name = match self.current_ident() {
            Some(n) => n,
            None => {
                self.pos += 1;
                return;
            }
        };
        self.pos += 1;

        // Type parameters or an array length; both are bracketed and both
        // precede the underlying type.
        if self.current_is_punct('[') {
            self.skip_balanced('[', ']');
        }
        if self.current_is_punct('=') {
            self.pos += 1; // alias declaration
        }

        let exported = is_exported(&name);
        while self.pos < limit {
            if self.at_statement_boundary() {
                break;
            }
            match &self.tokens[self.pos].kind {
                TokKind::Keyword(Keyword::Interface) => self.harvest_interface(&name, exported),
                TokKind::Keyword(Keyword::Struct) => self.harvest_struct(),
                TokKind::Punct('{') => self.skip_balanced('{', '}'),
                TokKind::Punct('(') => self.skip_balanced('(', ')'),
                TokKind::Punct('[') => self.skip_balanced('[', ']'),
                _ => self.pos += 1,
            }
        }
        let end_line = block_end_line.unwrap_or_else(|| self.last_line());
        self.decls.push(Decl {
            name,
            kind: DeclKind::Type,
            exported,
            start_line,
            end_line,
            tokens: spec_start..self.pos,
        });
    }

    /// Record the method signatures of `interface { ... }` starting at the
    /// `interface` keyword.
    fn harvest_interface(&mut self, iface_name: &str, iface_exported: bool) {
        self.pos += 1; // interface
        if !self.current_is_punct('{') {
            return;
        }
        let close = find_matching(&self.tokens, self.pos, '{', '}');
        self.pos += 1;
        while self.pos < close {
            let is_method = self.current_ident().is_some()
                && self
                    .tokens
                    .get(self.pos + 1)
                    .is_some_and(|t| t.kind.is_punct('('));
            if !is_method {
                // Embedded interface or punctuation.
                self.pos += 1;
                continue;
            }
            let method_name = self.current_ident().unwrap_or_default();
            let start = self.tokens[self.pos].line;
            self.pos += 1;
            self.skip_balanced('(', ')'); // parameters
            // Results run to the end of the signature line.
            while self.pos < close {
                if self.at_statement_boundary() {
                    break;
                }
                match &self.tokens[self.pos].kind {
                    TokKind::Punct('(') => self.skip_balanced('(', ')'),
                    TokKind::Punct('[') => self.skip_balanced('[', ']'),
                    TokKind::Punct('{') => self.skip_balanced('{', '}'),
                    _ => self.pos += 1,
                }
            }
            let end = self.last_line();
            if iface_exported && is_exported(&method_name) {
                self.interface_methods.push(InterfaceMethod {
                    interface_name: iface_name.to_string(),
                    method_name,
                    start_line: start,
                    end_line: end,
                });
            }
        }
        self.pos = close + 1;
    }

    /// Record the field types of `struct { ... }` starting at the `struct`
    /// keyword.
    fn harvest_struct(&mut self) {
        self.pos += 1; // struct
        if !self.current_is_punct('{') {
            return;
        }
        let close = find_matching(&self.tokens, self.pos, '{', '}');
        self.pos += 1;
        while self.pos < close {
            let run_start = self.pos;
            while self.pos < close {
                if self.pos > run_start && self.at_statement_boundary() {
                    break;
                }
                match &self.tokens[self.pos].kind {
                    TokKind::Punct('{') => self.skip_balanced('{', '}'),
                    TokKind::Punct('(') => self.skip_balanced('(', ')'),
                    TokKind::Punct('[') => self.skip_balanced('[', ']'),
                    _ => self.pos += 1,
                }
            }
            if self.pos > run_start {
                if let Some(r) = extract_type_ref(&self.tokens[run_start..self.pos]) {
                    self.struct_field_types.push(r);
                }
            } else {
                self.pos += 1;
            }
        }
        self.pos = close + 1;
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    fn parse_value_decl(&mut self) {
        let kw_line = self.tokens[self.pos].line;
        self.pos += 1; // var | const
        if self.current_is_punct('(') {
            let close = find_matching(&self.tokens, self.pos, '(', ')');
            self.pos += 1;
            while self.pos < close {
                if self.current_ident().is_some() {
                    self.parse_value_spec(None, close);
                } else {
                    self.pos += 1;
                }
            }
            self.pos = close + 1;
        } else if self.current_ident().is_some() {
            let limit = self.tokens.len();
            self.parse_value_spec(Some(kw_line), limit);
        }
    }

    fn parse_value_spec(&mut self, decl_line: Option<u32>, limit: usize) {
        let spec_start = self.pos;
        let mut names = Vec::new();
        match self.current_ident() {
            Some(n) => {
                names.push(n);
                self.pos += 1;
            }
            None => {
                self.pos += 1;
                return;
            }
        }
        while self.current_is_punct(',') {
            match self.tokens.get(self.pos + 1).and_then(|t| t.kind.ident()) {
                Some(name) => {
                    names.push(name.to_string());
                    self.pos += 2;
                }
                None => break,
            }
        }
        let start_line = decl_line.unwrap_or(self.tokens[spec_start].line);

        while self.pos < limit {
            if self.at_statement_boundary() {
                break;
            }
            match &self.tokens[self.pos].kind {
                TokKind::Punct('{') => self.skip_balanced('{', '}'),
                TokKind::Punct('(') => self.skip_balanced('(', ')'),
                TokKind::Punct('[') => self.skip_balanced('[', ']'),
                _ => self.pos += 1,
            }
        }
        let end_line = self.last_line();
        for name in names {
            let exported = is_exported(&name);
            self.decls.push(Decl {
                name,
                kind: DeclKind::Value,
                exported,
                start_line,
                end_line,
                tokens: spec_start..self.pos,
            });
        }
    }
}

/// Extract a type reference from one parameter/result/field fragment: drop a
/// trailing struct tag, then take the trailing identifier, with its selector
/// qualifier when qualified. Fragments that end in brackets (function types,
/// anonymous structs, `interface{}`) contribute nothing.
fn extract_type_ref(tokens: &[Token]) -> Option<TypeRef> {
    let mut end = tokens.len();
    while end > 0 && matches!(tokens[end - 1].kind, TokKind::Str(_)) {
        end -= 1; // struct tag
    }
    let tokens = &tokens[..end];
    let last = tokens.last()?;
    let name = last.kind.ident()?.to_string();
    if tokens.len() >= 3 && tokens[end - 2].kind.is_punct('.') {
        if let Some(qualifier) = tokens[end - 3].kind.ident() {
            return Some(TypeRef {
                qualifier: Some(qualifier.to_string()),
                name,
            });
        }
    }
    Some(TypeRef {
        qualifier: None,
        name,
    })
}

// ============================================================================
// Tests
// ============================================================================
