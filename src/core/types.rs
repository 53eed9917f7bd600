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

//! Core data model for static test discovery.
//!
//! A parsed file becomes a [`SourceUnit`]: an arena of [`Declaration`]s plus
//! the file's [`ImportTable`] and any recovered-parse diagnostics. Hierarchy
//! resolution and classification derive read-only views over the arena; the
//! final per-file output is a [`FileDiscovery`] tree.

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::core::import_table::ImportTable;

/// Index of a declaration in a [`SourceUnit`] arena.
pub type DeclId = usize;

/// A location in the analyzed source. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A recoverable issue found while analyzing a file.
///
/// Diagnostics are a channel separate from the discovery tree: a file with
/// diagnostics may still produce a (partial) tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub position: SourcePosition,
    pub message: String,
}

impl Diagnostic {
    pub fn new(position: SourcePosition, message: String) -> Self {
        Self { position, message }
    }
}

/// The origin a local name was imported from, as declared.
///
/// `module` is the dotted module path split into segments (empty for
/// `from . import x`), `level` the number of leading dots (0 = absolute),
/// `name` the original imported name and `alias` the `as` rename, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub module: Vec<String>,
    pub level: u32,
    pub name: String,
    pub alias: Option<String>,
    /// True for `import x[.y]` forms, where the binding refers to a module
    /// rather than to a name inside one.
    pub module_import: bool,
}

impl Origin {
    /// Path segments the bound local name stands for.
    ///
    /// For `import a.b.c` the bare name reaches only the top-level package;
    /// an alias refers to the full dotted path. For `from X import A` the
    /// name stands for `X.A`.
    pub fn referent(&self) -> Vec<String> {
        if self.module_import {
            if self.alias.is_some() || self.module.len() == 1 {
                self.module.clone()
            } else {
                vec![self.module[0].clone()]
            }
        } else {
            let mut parts = self.module.clone();
            parts.push(self.name.clone());
            parts
        }
    }
}

/// Canonical (module path, name) identity of a symbol, independent of local
/// aliasing. Relative origins keep their level so they stay distinguishable
/// from absolute ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OriginKey {
    pub module: Vec<String>,
    pub level: u32,
    pub name: String,
}

impl OriginKey {
    /// Build an absolute key from a dotted path like `unittest.TestCase`.
    pub fn absolute(dotted: &str) -> Self {
        let mut parts: Vec<String> = dotted.split('.').map(str::to_string).collect();
        let name = parts.pop().unwrap_or_default();
        Self {
            module: parts,
            level: 0,
            name,
        }
    }

    /// Build a key from ordered path segments, the last being the name.
    pub fn from_parts(level: u32, mut parts: Vec<String>) -> Option<Self> {
        let name = parts.pop()?;
        Some(Self {
            module: parts,
            level,
            name,
        })
    }

    /// Resolve a relative key against the analyzed file's package-relative
    /// module path (e.g. `pkg.sub.test_mod`). Returns `None` when the level
    /// escapes the package root; the relative key then stays as-is.
    pub fn absolutize(&self, module_path: &str) -> Option<OriginKey> {
        if self.level == 0 {
            return Some(self.clone());
        }

        let mut base: Vec<&str> = module_path.split('.').collect();
        if (self.level as usize) > base.len() {
            return None;
        }
        base.truncate(base.len() - self.level as usize);

        let mut module: Vec<String> = base.into_iter().map(str::to_string).collect();
        module.extend(self.module.iter().cloned());
        Some(OriginKey {
            module,
            level: 0,
            name: self.name.clone(),
        })
    }
}

impl fmt::Display for OriginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            write!(f, ".")?;
        }
        for segment in &self.module {
            write!(f, "{}.", segment)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Syntactic shape of a decorator or base-class expression.
///
/// The engine recognizes decorators by resolving these shapes to origins,
/// never by a fixed vocabulary of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolExpr {
    /// A bare identifier, e.g. `skip`.
    Name { id: String, position: SourcePosition },
    /// A dotted chain rooted at an identifier, e.g. `unittest.skip`.
    /// `parts` holds the segments root-first.
    Attribute {
        parts: Vec<String>,
        position: SourcePosition,
    },
    /// A call wrapping another shape, e.g. `skipIf(cond, "why")`.
    Call {
        callee: Box<SymbolExpr>,
        position: SourcePosition,
    },
    /// Anything else, kept as opaque source text.
    Opaque { text: String, position: SourcePosition },
}

impl SymbolExpr {
    pub fn position(&self) -> SourcePosition {
        match self {
            SymbolExpr::Name { position, .. }
            | SymbolExpr::Attribute { position, .. }
            | SymbolExpr::Call { position, .. }
            | SymbolExpr::Opaque { position, .. } => *position,
        }
    }

    /// Human-readable rendering for diagnostics and "unknown base" records.
    pub fn text(&self) -> String {
        match self {
            SymbolExpr::Name { id, .. } => id.clone(),
            SymbolExpr::Attribute { parts, .. } => parts.join("."),
            SymbolExpr::Call { callee, .. } => format!("{}(...)", callee.text()),
            SymbolExpr::Opaque { text, .. } => text.clone(),
        }
    }
}

/// A `with self.subTest(...)` site found in a test method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubTest {
    pub label: SubTestLabel,
    pub position: SourcePosition,
}

/// The label of a sub-test site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTestLabel {
    /// A literal first argument, recorded verbatim.
    Literal(String),
    /// A non-literal first argument, recorded as opaque source text.
    Computed(String),
    /// No positional argument.
    Empty,
}

impl SubTestLabel {
    /// The label as shown in the discovery tree.
    pub fn display(&self) -> String {
        match self {
            SubTestLabel::Literal(text) => text.clone(),
            SubTestLabel::Computed(text) => format!("<computed: {}>", text),
            SubTestLabel::Empty => String::new(),
        }
    }
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone)]
pub enum DeclKind {
    Class {
        /// Base-class expressions in declaration order.
        bases: Vec<SymbolExpr>,
    },
    Function {
        /// Sub-test sites found in the body, in source order.
        subtests: Vec<SubTest>,
    },
}

/// One class or function declaration in a [`SourceUnit`] arena.
///
/// Parent/child links are arena indices, so identity is the declaration
/// position: two same-named siblings stay distinct nodes.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    pub decorators: Vec<SymbolExpr>,
    pub position: SourcePosition,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub docstring: Option<String>,
}

impl Declaration {
    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Function { .. })
    }
}

/// One analyzed file. Immutable after construction.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Opaque file identifier supplied by the caller.
    pub file_id: String,
    /// Package-relative module path, when the caller knows it. Used only to
    /// absolutize relative-import origin keys.
    pub module: Option<String>,
    /// Declaration arena; parent/child links index into this vector.
    pub decls: Vec<Declaration>,
    /// Top-level declarations in document order.
    pub roots: Vec<DeclId>,
    pub imports: ImportTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceUnit {
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id]
    }

    /// Dotted declaration path within the file, e.g. `Outer.Inner.test_a`.
    pub fn qualified_name(&self, id: DeclId) -> String {
        let mut parts = vec![self.decls[id].name.as_str()];
        let mut current = self.decls[id].parent;
        while let Some(parent) = current {
            parts.push(self.decls[parent].name.as_str());
            current = self.decls[parent].parent;
        }
        parts.reverse();
        parts.join(".")
    }
}

/// Outcome of resolving one base-class (or decorator) expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedBase {
    /// Positively resolved through an explicit import or attribute chain.
    Known(OriginKey),
    /// Tentatively attributed to a wildcard import. Never satisfies the
    /// test-base or skip-marker check on its own.
    LowConfidence(OriginKey),
    /// Unresolvable; kept as opaque text, contributes nothing to closure
    /// checks.
    Unknown(String),
}

/// A class after hierarchy resolution and classification.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub decl: DeclId,
    pub name: String,
    pub position: SourcePosition,
    /// Transitive, cycle-guarded closure of resolved base origins.
    pub bases: IndexSet<ResolvedBase>,
    pub is_test_case: bool,
    pub is_skipped: bool,
    pub members: Vec<ResolvedMember>,
}

/// A classified member of a resolved class, in declaration order.
#[derive(Debug, Clone)]
pub enum ResolvedMember {
    Method(TestMethod),
    Class(ResolvedClass),
}

/// A method matching the test-name convention inside a test-case class.
#[derive(Debug, Clone)]
pub struct TestMethod {
    pub decl: DeclId,
    pub name: String,
    pub position: SourcePosition,
    pub is_skipped: bool,
    pub subtests: Vec<SubTest>,
}

/// Kind of a node in the discovery tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Class,
    Method,
    SubTest,
}

/// One node of the per-file discovery tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryNode {
    pub kind: NodeKind,
    pub name: String,
    pub is_test_case: bool,
    pub is_skipped: bool,
    /// Nesting path from the file root down to this node, inclusive.
    pub path: Vec<String>,
    pub position: SourcePosition,
    pub children: Vec<DiscoveryNode>,
}

/// The discovery result for one file: the ordered tree plus the separate
/// diagnostics channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiscovery {
    pub file_id: String,
    pub module: Option<String>,
    pub nodes: Vec<DiscoveryNode>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileDiscovery {
    /// Flat dotted identifiers of all discovered test methods, in document
    /// order, each with its skip state.
    pub fn test_ids(&self) -> Vec<(String, bool)> {
        fn walk(node: &DiscoveryNode, module: Option<&str>, out: &mut Vec<(String, bool)>) {
            if node.kind == NodeKind::Method {
                let dotted = node.path.join(".");
                let id = match module {
                    Some(module) => format!("{}.{}", module, dotted),
                    None => dotted,
                };
                out.push((id, node.is_skipped));
            }
            for child in &node.children {
                walk(child, module, out);
            }
        }

        let mut out = Vec::new();
        for node in &self.nodes {
            walk(node, self.module.as_deref(), &mut out);
        }
        out
    }
}

/// Invalid engine configuration. Fatal at engine construction, before any
/// file is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no test base origins configured")]
    NoTestBases,
    #[error("invalid origin `{0}`: empty path segment")]
    InvalidOrigin(String),
    #[error("test name prefix must not be empty")]
    EmptyPrefix,
}
