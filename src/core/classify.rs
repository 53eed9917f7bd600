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

//! Test classification.
//!
//! Walks the declaration tree in document order with a skip context: a class
//! carrying a resolved skip marker disables every method and nested class
//! beneath it, whatever their own decorators say. Nested classes are
//! classified independently of their enclosing class's status, so a test
//! class inside a plain container is still found.

use crate::config::DiscoveryConfig;
use crate::core::hierarchy::HierarchyResolver;
use crate::core::types::{
    DeclId, DeclKind, ResolvedClass, ResolvedMember, SourceUnit, SymbolExpr, TestMethod,
};

/// Classify every top-level class of a unit, recursively.
pub fn classify_unit(unit: &SourceUnit, config: &DiscoveryConfig) -> Vec<ResolvedClass> {
    let mut resolver = HierarchyResolver::new(unit);
    unit.roots
        .iter()
        .filter(|&&id| unit.decl(id).is_class())
        .map(|&id| classify_class(unit, config, &mut resolver, id, false))
        .collect()
}

fn classify_class(
    unit: &SourceUnit,
    config: &DiscoveryConfig,
    resolver: &mut HierarchyResolver<'_>,
    id: DeclId,
    inherited_skip: bool,
) -> ResolvedClass {
    let bases = resolver.closure(id);
    let is_test_case = resolver.is_test_case(&bases, config);

    let decl = unit.decl(id);
    let own_skip = has_skip_decorator(&decl.decorators, resolver, config);
    let is_skipped = own_skip || inherited_skip;

    if is_test_case {
        tracing::debug!(
            "{} is a test case{}",
            unit.qualified_name(id),
            if is_skipped { " (skipped)" } else { "" }
        );
    }

    let mut members = Vec::new();
    for &child in &decl.children {
        let child_decl = unit.decl(child);
        match &child_decl.kind {
            DeclKind::Class { .. } => {
                members.push(ResolvedMember::Class(classify_class(
                    unit, config, resolver, child, is_skipped,
                )));
            }
            DeclKind::Function { subtests } => {
                // Test methods exist only inside test-case classes; a
                // same-named method on a plain class is not a test.
                if is_test_case && child_decl.name.starts_with(&config.test_name_prefix) {
                    members.push(ResolvedMember::Method(TestMethod {
                        decl: child,
                        name: child_decl.name.clone(),
                        position: child_decl.position,
                        is_skipped: is_skipped
                            || has_skip_decorator(&child_decl.decorators, resolver, config),
                        subtests: subtests.clone(),
                    }));
                }
            }
        }
    }

    ResolvedClass {
        decl: id,
        name: decl.name.clone(),
        position: decl.position,
        bases,
        is_test_case,
        is_skipped,
        members,
    }
}

fn has_skip_decorator(
    decorators: &[SymbolExpr],
    resolver: &HierarchyResolver<'_>,
    config: &DiscoveryConfig,
) -> bool {
    decorators
        .iter()
        .any(|decorator| resolver.is_skip_marker(decorator, config))
}
