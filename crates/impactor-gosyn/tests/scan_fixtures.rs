//! Whole-file scans over realistic Go sources.

use impactor_gosyn::{method_calls_in, selector_pairs_in, DeclKind, GoFile};

const HANDLER: &str = r#"package gateway

import (
	"context"
	"fmt"

	mcm "example.com/m/pkg/domain/mcm"
	"example.com/m/sqlc"
)

const defaultTimeout = 30

var ErrNotFound = fmt.Errorf("not found")

// Server serves the public API.
type Server struct {
	client mcm.Client
	db     *sqlc.Queries
}

// Run starts the gateway and blocks until the context is done.
func Run(ctx context.Context) error {
	srv, err := newServer(ctx)
	if err != nil {
		return err
	}
	return srv.serve(ctx)
}

func newServer(ctx context.Context) (*Server, error) {
	return &Server{}, nil
}

func (s *Server) serve(ctx context.Context) error {
	row, err := s.db.GetUser(ctx, "id")
	if err != nil {
		return ErrNotFound
	}
	return s.client.Notify(ctx, fmt.Sprint(row))
}

type Checker interface {
	Check(ctx context.Context) error
	Name() string
}
"#;

const RAW_AND_ESCAPES: &str = "package p\n\nvar query = `SELECT *\nFROM users\nWHERE id = $1`\n\nvar label = \"multi \\\"quoted\\\" token\"\n\nfunc After() {}\n"; // keeps line math honest past raw strings

#[test]
fn full_handler_file_scans_cleanly() {
    let file = GoFile::parse(HANDLER).unwrap();
    assert_eq!(file.package, "gateway");
    assert_eq!(file.imports.len(), 4);
    assert_eq!(
        file.resolve_alias("mcm"),
        Some("example.com/m/pkg/domain/mcm")
    );

    // Declarations, with kinds.
    assert_eq!(file.decl_named("defaultTimeout").unwrap().kind, DeclKind::Value);
    assert_eq!(file.decl_named("ErrNotFound").unwrap().kind, DeclKind::Value);
    assert_eq!(file.decl_named("Server").unwrap().kind, DeclKind::Type);
    assert_eq!(file.decl_named("Run").unwrap().kind, DeclKind::Func);
    assert!(file.decl_named("newServer").is_some());
    assert!(!file.decl_named("newServer").unwrap().exported);
    assert_eq!(
        file.exported_decl_names(),
        vec!["ErrNotFound", "Server", "Run", "Checker"]
    );

    // Interface methods of Checker.
    let methods: Vec<&str> = file
        .interface_methods
        .iter()
        .map(|m| m.method_name.as_str())
        .collect();
    assert_eq!(methods, vec!["Check", "Name"]);

    // Struct fields carry their qualified types.
    assert!(file
        .struct_field_types
        .iter()
        .any(|t| t.qualifier.as_deref() == Some("mcm") && t.name == "Client"));
    assert!(file
        .struct_field_types
        .iter()
        .any(|t| t.qualifier.as_deref() == Some("sqlc") && t.name == "Queries"));
}

#[test]
fn method_calls_and_selectors_across_the_file() {
    let file = GoFile::parse(HANDLER).unwrap();
    let calls = method_calls_in(file.tokens(), 0..file.tokens().len());
    let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"GetUser"));
    assert!(names.contains(&"Notify"));
    assert!(names.contains(&"Sprint"));

    let pairs = selector_pairs_in(file.tokens(), 0..file.tokens().len());
    assert!(pairs
        .iter()
        .any(|p| p.base == "fmt" && p.selected == "Errorf"));
}

#[test]
fn scan_restricted_to_one_declaration() {
    let file = GoFile::parse(HANDLER).unwrap();
    let run = file.decl_named("Run").unwrap();
    let calls = method_calls_in(file.tokens(), run.tokens.clone());
    let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
    // Run calls newServer(ctx) (not through a selector) and srv.serve(ctx).
    assert!(names.contains(&"serve"));
    assert!(!names.contains(&"GetUser"));
}

#[test]
fn raw_strings_and_escapes_do_not_skew_lines() {
    let file = GoFile::parse(RAW_AND_ESCAPES).unwrap();
    let after = file.decl_named("After").unwrap();
    // The raw string spans lines 3-5; After sits on line 9.
    assert_eq!(after.start_line, 9);
    let query = file.decl_named("query").unwrap();
    assert_eq!(query.start_line, 3);
}
