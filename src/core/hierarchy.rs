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

//! Class hierarchy resolution.
//!
//! Rewrites base-class expressions to canonical origins through the file's
//! import table, follows same-file bases through enclosing scopes, and
//! computes the transitive closure of base origins per class. The closure is
//! cycle-guarded (a cycle terminates the closure, it is not an error) and
//! memoized per file.

use indexmap::IndexSet;
use std::collections::HashSet;

use crate::config::DiscoveryConfig;
use crate::core::import_table::ImportBinding;
use crate::core::types::{DeclId, DeclKind, OriginKey, ResolvedBase, SourceUnit, SymbolExpr};

pub struct HierarchyResolver<'a> {
    unit: &'a SourceUnit,
    memo: Vec<Option<IndexSet<ResolvedBase>>>,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(unit: &'a SourceUnit) -> Self {
        Self {
            memo: vec![None; unit.decls.len()],
            unit,
        }
    }

    /// The transitive closure of resolved base origins for a class.
    pub fn closure(&mut self, id: DeclId) -> IndexSet<ResolvedBase> {
        let mut visiting = HashSet::new();
        self.closure_guarded(id, &mut visiting)
    }

    fn closure_guarded(
        &mut self,
        id: DeclId,
        visiting: &mut HashSet<DeclId>,
    ) -> IndexSet<ResolvedBase> {
        if let Some(memoized) = &self.memo[id] {
            return memoized.clone();
        }
        if !visiting.insert(id) {
            // Cycle: a class cannot be its own ancestor. Closure stops here.
            tracing::debug!(
                "inheritance cycle at {}, stopping closure",
                self.unit.qualified_name(id)
            );
            return IndexSet::new();
        }

        let bases = match &self.unit.decl(id).kind {
            DeclKind::Class { bases } => bases.clone(),
            DeclKind::Function { .. } => Vec::new(),
        };

        let mut out = IndexSet::new();
        for base in &bases {
            match base {
                SymbolExpr::Name { id: name, .. } => {
                    if let Some(binding) = self.unit.imports.lookup(name) {
                        out.insert(ResolvedBase::Known(self.canonical(binding, &[])));
                    } else if let Some(other) = self.lookup_scope_class(name, id) {
                        // Same-file base: inherit its resolved origin set.
                        out.extend(self.closure_guarded(other, visiting));
                    } else if let Some(wildcard) = self.unit.imports.last_wildcard() {
                        out.insert(ResolvedBase::LowConfidence(
                            self.absolutized(wildcard.attributed_key(name)),
                        ));
                    } else {
                        out.insert(ResolvedBase::Unknown(name.clone()));
                    }
                }
                SymbolExpr::Attribute { parts, .. } => {
                    match self.unit.imports.lookup(&parts[0]) {
                        Some(binding) => {
                            out.insert(ResolvedBase::Known(self.canonical(binding, &parts[1..])));
                        }
                        None => {
                            out.insert(ResolvedBase::Unknown(parts.join(".")));
                        }
                    }
                }
                SymbolExpr::Call { .. } | SymbolExpr::Opaque { .. } => {
                    out.insert(ResolvedBase::Unknown(base.text()));
                }
            }
        }

        visiting.remove(&id);
        self.memo[id] = Some(out.clone());
        tracing::debug!(
            "resolved {} base closure: {} entries",
            self.unit.qualified_name(id),
            out.len()
        );
        out
    }

    /// Resolve a decorator (or any standalone symbol) to an origin using the
    /// same resolution path as base classes. `None` means the symbol is
    /// inert: no import binding and no wildcard to attribute it to.
    pub fn resolve_symbol(&self, expr: &SymbolExpr) -> Option<ResolvedBase> {
        match expr {
            SymbolExpr::Name { id, .. } => {
                if let Some(binding) = self.unit.imports.lookup(id) {
                    Some(ResolvedBase::Known(self.canonical(binding, &[])))
                } else {
                    self.unit
                        .imports
                        .last_wildcard()
                        .map(|w| ResolvedBase::LowConfidence(self.absolutized(w.attributed_key(id))))
                }
            }
            SymbolExpr::Attribute { parts, .. } => self
                .unit
                .imports
                .lookup(&parts[0])
                .map(|binding| ResolvedBase::Known(self.canonical(binding, &parts[1..]))),
            SymbolExpr::Call { callee, .. } => self.resolve_symbol(callee),
            SymbolExpr::Opaque { .. } => None,
        }
    }

    /// Whether a decorator expression positively resolves to a configured
    /// skip marker. Low-confidence wildcard attribution never activates it.
    pub fn is_skip_marker(&self, expr: &SymbolExpr, config: &DiscoveryConfig) -> bool {
        match self.resolve_symbol(expr) {
            Some(ResolvedBase::Known(key)) => {
                let matched = config.skip_marker_origins.contains(&key);
                if matched {
                    tracing::debug!("decorator {} resolves to skip marker {}", expr.text(), key);
                }
                matched
            }
            _ => false,
        }
    }

    /// Whether a closure reaches one of the configured test-base origins.
    pub fn is_test_case(&self, closure: &IndexSet<ResolvedBase>, config: &DiscoveryConfig) -> bool {
        closure.iter().any(|base| {
            matches!(base, ResolvedBase::Known(key) if config.test_base_origins.contains(key))
        })
    }

    fn canonical(&self, binding: &ImportBinding, chain: &[String]) -> OriginKey {
        self.absolutized(binding.canonical_key(chain))
    }

    /// Rewrite relative keys against the file's package-relative module
    /// path, when the caller supplied one.
    fn absolutized(&self, key: OriginKey) -> OriginKey {
        if key.level == 0 {
            return key;
        }
        match &self.unit.module {
            Some(module) => key.absolutize(module).unwrap_or(key),
            None => key,
        }
    }

    /// Find the class a bare identifier refers to: the sequentially last
    /// same-named class declaration in the nearest enclosing scope. Shadowed
    /// earlier declarations are not visible to lookups; the referencing
    /// class itself never is.
    fn lookup_scope_class(&self, name: &str, from: DeclId) -> Option<DeclId> {
        let mut scope = self.unit.decl(from).parent;
        loop {
            let siblings = match scope {
                Some(parent) => &self.unit.decl(parent).children,
                None => &self.unit.roots,
            };
            let found = siblings.iter().rev().find(|&&candidate| {
                candidate != from
                    && self.unit.decl(candidate).is_class()
                    && self.unit.decl(candidate).name == name
            });
            if let Some(&candidate) = found {
                return Some(candidate);
            }
            match scope {
                Some(parent) => scope = self.unit.decl(parent).parent,
                None => return None,
            }
        }
    }
}
