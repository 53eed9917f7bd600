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

//! Discovery catalog assembly.
//!
//! Turns the classified class tree into the per-file output tree. Non-test
//! container classes are kept as structural nodes when a test class exists
//! beneath them and dropped as leaves otherwise. The builder only reads; the
//! source unit is never mutated.

use crate::core::types::{
    DiscoveryNode, FileDiscovery, NodeKind, ResolvedClass, ResolvedMember, SourceUnit, TestMethod,
};

/// Assemble the discovery tree for one analyzed unit.
pub fn build_catalog(unit: &SourceUnit, classes: &[ResolvedClass]) -> FileDiscovery {
    let mut path = Vec::new();
    let nodes = classes
        .iter()
        .filter_map(|class| class_node(class, &mut path))
        .collect();

    FileDiscovery {
        file_id: unit.file_id.clone(),
        module: unit.module.clone(),
        nodes,
        diagnostics: unit.diagnostics.clone(),
    }
}

fn class_node(class: &ResolvedClass, path: &mut Vec<String>) -> Option<DiscoveryNode> {
    if !class.is_test_case && !has_test_descendant(class) {
        return None;
    }

    path.push(class.name.clone());
    let children = class
        .members
        .iter()
        .filter_map(|member| match member {
            ResolvedMember::Method(method) => Some(method_node(method, path)),
            ResolvedMember::Class(nested) => class_node(nested, path),
        })
        .collect();
    let node = DiscoveryNode {
        kind: NodeKind::Class,
        name: class.name.clone(),
        is_test_case: class.is_test_case,
        is_skipped: class.is_skipped,
        path: path.clone(),
        position: class.position,
        children,
    };
    path.pop();

    Some(node)
}

fn method_node(method: &TestMethod, path: &mut Vec<String>) -> DiscoveryNode {
    path.push(method.name.clone());
    let children = method
        .subtests
        .iter()
        .map(|subtest| {
            let name = subtest.label.display();
            let mut subtest_path = path.clone();
            subtest_path.push(name.clone());
            DiscoveryNode {
                kind: NodeKind::SubTest,
                name,
                is_test_case: false,
                is_skipped: method.is_skipped,
                path: subtest_path,
                position: subtest.position,
                children: Vec::new(),
            }
        })
        .collect();
    let node = DiscoveryNode {
        kind: NodeKind::Method,
        name: method.name.clone(),
        is_test_case: false,
        is_skipped: method.is_skipped,
        path: path.clone(),
        position: method.position,
        children,
    };
    path.pop();

    node
}

fn has_test_descendant(class: &ResolvedClass) -> bool {
    class.members.iter().any(|member| match member {
        ResolvedMember::Class(nested) => nested.is_test_case || has_test_descendant(nested),
        ResolvedMember::Method(_) => false,
    })
}
