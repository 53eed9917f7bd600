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

//! Source collection using Ruff's parser.
//!
//! Turns raw source text into a [`SourceUnit`]: the declaration arena, the
//! import log and the diagnostics of one file. Parsing uses
//! [`parse_unchecked`] so partially invalid files still yield a best-effort
//! tree; parse errors become diagnostics instead of failures.

use ruff_python_ast::{Expr, Mod, Stmt, StmtClassDef, StmtFunctionDef};
use ruff_python_parser::{parse_unchecked, Mode};
use ruff_text_size::{Ranged, TextSize};

use crate::core::import_table::ImportTable;
use crate::core::subtest::collect_subtests;
use crate::core::types::{
    DeclId, DeclKind, Declaration, Diagnostic, SourcePosition, SourceUnit, SymbolExpr,
};

/// Byte-offset to line/column conversion for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(offset as u32 + 1);
            }
        }
        Self { line_starts }
    }

    pub fn position(&self, offset: TextSize) -> SourcePosition {
        let offset = offset.to_u32();
        let line = self.line_starts.partition_point(|&start| start <= offset);
        SourcePosition {
            line: line as u32,
            column: offset - self.line_starts[line - 1],
        }
    }
}

/// Builds a [`SourceUnit`] from source text.
pub struct SourceCollector<'a> {
    file_id: String,
    module: Option<String>,
    source: &'a str,
    lines: LineIndex,
    decls: Vec<Declaration>,
    roots: Vec<DeclId>,
    imports: ImportTable,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SourceCollector<'a> {
    pub fn new(file_id: &str, module: Option<&str>, source: &'a str) -> Self {
        Self {
            file_id: file_id.to_string(),
            module: module.map(str::to_string),
            source,
            lines: LineIndex::new(source),
            decls: Vec::new(),
            roots: Vec::new(),
            imports: ImportTable::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Parse and collect. Never fails: an unparseable file yields an empty
    /// declaration tree plus its diagnostics.
    pub fn collect(mut self) -> SourceUnit {
        let parsed = parse_unchecked(self.source, Mode::Module);

        for error in parsed.errors() {
            self.diagnostics.push(Diagnostic::new(
                self.lines.position(error.location.start()),
                error.error.to_string(),
            ));
        }

        match parsed.into_syntax() {
            Mod::Module(module) => self.visit_body(&module.body, None),
            Mod::Expression(_) => {}
        }

        SourceUnit {
            file_id: self.file_id,
            module: self.module,
            decls: self.decls,
            roots: self.roots,
            imports: self.imports,
            diagnostics: self.diagnostics,
        }
    }

    fn visit_body(&mut self, body: &[Stmt], parent: Option<DeclId>) {
        for stmt in body {
            self.visit_stmt(stmt, parent);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt, parent: Option<DeclId>) {
        match stmt {
            Stmt::Import(import) => {
                let position = self.position(stmt.range().start());
                for alias in &import.names {
                    self.imports.record_plain(
                        alias.name.as_str(),
                        alias.asname.as_ref().map(|n| n.as_str()),
                        position,
                    );
                }
            }
            Stmt::ImportFrom(import) => {
                let position = self.position(stmt.range().start());
                let module: Vec<String> = match &import.module {
                    Some(module) => module.as_str().split('.').map(str::to_string).collect(),
                    None => Vec::new(),
                };
                for alias in &import.names {
                    if alias.name.as_str() == "*" {
                        self.imports.record_wildcard(&module, import.level, position);
                    } else {
                        self.imports.record_from(
                            &module,
                            import.level,
                            alias.name.as_str(),
                            alias.asname.as_ref().map(|n| n.as_str()),
                            position,
                        );
                    }
                }
            }
            Stmt::ClassDef(class_def) => self.visit_class(class_def, parent),
            Stmt::FunctionDef(func) => self.visit_function(func, parent),
            // Declarations and imports may sit inside conditional blocks;
            // descend so they are seen in document order.
            Stmt::If(stmt_if) => {
                self.visit_body(&stmt_if.body, parent);
                for clause in &stmt_if.elif_else_clauses {
                    self.visit_body(&clause.body, parent);
                }
            }
            Stmt::For(stmt_for) => {
                self.visit_body(&stmt_for.body, parent);
                self.visit_body(&stmt_for.orelse, parent);
            }
            Stmt::While(stmt_while) => {
                self.visit_body(&stmt_while.body, parent);
                self.visit_body(&stmt_while.orelse, parent);
            }
            Stmt::With(stmt_with) => self.visit_body(&stmt_with.body, parent),
            Stmt::Try(stmt_try) => {
                self.visit_body(&stmt_try.body, parent);
                for handler in &stmt_try.handlers {
                    let ruff_python_ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.visit_body(&handler.body, parent);
                }
                self.visit_body(&stmt_try.orelse, parent);
                self.visit_body(&stmt_try.finalbody, parent);
            }
            _ => {}
        }
    }

    fn visit_class(&mut self, class_def: &StmtClassDef, parent: Option<DeclId>) {
        let bases: Vec<SymbolExpr> = class_def
            .bases()
            .iter()
            .map(|base| self.symbol_expr(base))
            .collect();
        let decorators: Vec<SymbolExpr> = class_def
            .decorator_list
            .iter()
            .map(|d| self.symbol_expr(&d.expression))
            .collect();

        let id = self.push_decl(Declaration {
            name: class_def.name.to_string(),
            kind: DeclKind::Class { bases },
            decorators,
            position: self.position(class_def.range().start()),
            parent,
            children: Vec::new(),
            docstring: docstring(&class_def.body),
        });

        self.visit_body(&class_def.body, Some(id));
    }

    fn visit_function(&mut self, func: &StmtFunctionDef, parent: Option<DeclId>) {
        let decorators: Vec<SymbolExpr> = func
            .decorator_list
            .iter()
            .map(|d| self.symbol_expr(&d.expression))
            .collect();
        let subtests = collect_subtests(&func.body, self.source, &self.lines);

        let id = self.push_decl(Declaration {
            name: func.name.to_string(),
            kind: DeclKind::Function { subtests },
            decorators,
            position: self.position(func.range().start()),
            parent,
            children: Vec::new(),
            docstring: docstring(&func.body),
        });

        // Nested defs and classes are declarations too, even though
        // classification only descends class-into-class.
        self.visit_body(&func.body, Some(id));
    }

    fn push_decl(&mut self, decl: Declaration) -> DeclId {
        let id = self.decls.len();
        let parent = decl.parent;
        self.decls.push(decl);
        match parent {
            Some(parent) => self.decls[parent].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Reduce a decorator or base expression to its syntactic shape.
    fn symbol_expr(&self, expr: &Expr) -> SymbolExpr {
        let position = self.position(expr.range().start());
        match expr {
            Expr::Name(name) => SymbolExpr::Name {
                id: name.id.to_string(),
                position,
            },
            Expr::Attribute(_) => match attribute_chain(expr) {
                Some(parts) => SymbolExpr::Attribute { parts, position },
                None => SymbolExpr::Opaque {
                    text: self.text_at(expr).to_string(),
                    position,
                },
            },
            Expr::Call(call) => SymbolExpr::Call {
                callee: Box::new(self.symbol_expr(&call.func)),
                position,
            },
            _ => SymbolExpr::Opaque {
                text: self.text_at(expr).to_string(),
                position,
            },
        }
    }

    fn text_at(&self, expr: &Expr) -> &str {
        let range = expr.range();
        self.source
            .get(range.start().to_usize()..range.end().to_usize())
            .unwrap_or("")
    }

    fn position(&self, offset: TextSize) -> SourcePosition {
        self.lines.position(offset)
    }
}

/// Flatten a dotted chain rooted at a plain name, root-first.
fn attribute_chain(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Name(name) => Some(vec![name.id.to_string()]),
        Expr::Attribute(attr) => {
            let mut parts = attribute_chain(&attr.value)?;
            parts.push(attr.attr.to_string());
            Some(parts)
        }
        _ => None,
    }
}

/// The leading string literal of a declaration body, if any.
fn docstring(body: &[Stmt]) -> Option<String> {
    match body.first() {
        Some(Stmt::Expr(expr_stmt)) => match &*expr_stmt.value {
            Expr::StringLiteral(lit) => Some(lit.value.to_string()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_top_level_declarations() {
        let source = "import unittest\n\nclass A(unittest.TestCase):\n    def test_x(self):\n        pass\n";
        let unit = SourceCollector::new("test.py", None, source).collect();

        assert_eq!(unit.roots.len(), 1);
        let class = unit.decl(unit.roots[0]);
        assert_eq!(class.name, "A");
        assert!(class.is_class());
        assert_eq!(class.children.len(), 1);
        assert_eq!(unit.decl(class.children[0]).name, "test_x");
        assert!(unit.imports.lookup("unittest").is_some());
    }

    #[test]
    fn test_docstrings_captured_not_interpreted() {
        let source = "class A:\n    \"\"\"Helper container.\"\"\"\n    def f(self):\n        \"docs\"\n        pass\n";
        let unit = SourceCollector::new("test.py", None, source).collect();

        let class = unit.decl(unit.roots[0]);
        assert_eq!(class.docstring.as_deref(), Some("Helper container."));
        assert_eq!(unit.decl(class.children[0]).docstring.as_deref(), Some("docs"));
    }

    #[test]
    fn test_line_index_positions() {
        let lines = LineIndex::new("x = 1\ny = 2");
        assert_eq!(lines.position(TextSize::new(0)), SourcePosition::new(1, 0));
        assert_eq!(lines.position(TextSize::new(6)), SourcePosition::new(2, 0));
        assert_eq!(lines.position(TextSize::new(10)), SourcePosition::new(2, 4));
    }
}
