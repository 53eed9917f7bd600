// Copyright (C) 2024 Jelmer Vernooij <jelmer@samba.org>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Recognition of `with self.subTest(...)` sites.
//!
//! Discovery reports declared sub-test sites in source order, not dynamic
//! instance counts: a `subTest` inside a loop is one site, however many
//! times it would run.

use ruff_python_ast::{Expr, ExprCall, Stmt};
use ruff_text_size::Ranged;

use crate::core::collector::LineIndex;
use crate::core::types::{SubTest, SubTestLabel};

/// Scan a function body for sub-test sites, recursively through nested
/// compound statements. Nested `def`/`class` bodies are separate
/// declarations and are not scanned here.
pub fn collect_subtests(body: &[Stmt], source: &str, lines: &LineIndex) -> Vec<SubTest> {
    let mut found = Vec::new();
    scan_body(body, source, lines, &mut found);
    found
}

fn scan_body(body: &[Stmt], source: &str, lines: &LineIndex, found: &mut Vec<SubTest>) {
    for stmt in body {
        scan_stmt(stmt, source, lines, found);
    }
}

fn scan_stmt(stmt: &Stmt, source: &str, lines: &LineIndex, found: &mut Vec<SubTest>) {
    match stmt {
        Stmt::With(stmt_with) => {
            for item in &stmt_with.items {
                if let Expr::Call(call) = &item.context_expr {
                    if is_subtest_callee(&call.func) {
                        found.push(SubTest {
                            label: label_of(call, source),
                            position: lines.position(item.context_expr.range().start()),
                        });
                    }
                }
            }
            scan_body(&stmt_with.body, source, lines, found);
        }
        Stmt::If(stmt_if) => {
            scan_body(&stmt_if.body, source, lines, found);
            for clause in &stmt_if.elif_else_clauses {
                scan_body(&clause.body, source, lines, found);
            }
        }
        Stmt::For(stmt_for) => {
            scan_body(&stmt_for.body, source, lines, found);
            scan_body(&stmt_for.orelse, source, lines, found);
        }
        Stmt::While(stmt_while) => {
            scan_body(&stmt_while.body, source, lines, found);
            scan_body(&stmt_while.orelse, source, lines, found);
        }
        Stmt::Try(stmt_try) => {
            scan_body(&stmt_try.body, source, lines, found);
            for handler in &stmt_try.handlers {
                let ruff_python_ast::ExceptHandler::ExceptHandler(handler) = handler;
                scan_body(&handler.body, source, lines, found);
            }
            scan_body(&stmt_try.orelse, source, lines, found);
            scan_body(&stmt_try.finalbody, source, lines, found);
        }
        _ => {}
    }
}

/// True for `<receiver>.subTest`, whatever the receiver expression is.
fn is_subtest_callee(func: &Expr) -> bool {
    matches!(func, Expr::Attribute(attr) if attr.attr.as_str() == "subTest")
}

/// The label of a sub-test site: a literal first argument verbatim, a
/// computed one as opaque text, nothing when only keywords are given.
fn label_of(call: &ExprCall, source: &str) -> SubTestLabel {
    let Some(arg) = call.arguments.args.first() else {
        return SubTestLabel::Empty;
    };

    let text = source
        .get(arg.range().start().to_usize()..arg.range().end().to_usize())
        .unwrap_or("")
        .to_string();

    match arg {
        Expr::StringLiteral(lit) => SubTestLabel::Literal(lit.value.to_string()),
        Expr::NumberLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::NoneLiteral(_)
        | Expr::EllipsisLiteral(_) => SubTestLabel::Literal(text),
        _ => SubTestLabel::Computed(text),
    }
}
