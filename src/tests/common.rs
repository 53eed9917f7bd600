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

//! Common test utilities for discovery tests.

use crate::core::types::{DiscoveryNode, FileDiscovery, NodeKind, SourceUnit};
use crate::engine::DiscoveryEngine;

/// Run discovery over source code with the default module name.
pub fn discover(source: &str) -> FileDiscovery {
    discover_in_module(source, "test_module")
}

/// Run discovery over source code with a custom module name.
pub fn discover_in_module(source: &str, module: &str) -> FileDiscovery {
    DiscoveryEngine::default().analyze("test_module.py", source, Some(module))
}

/// Collect the declaration tree and import table without classifying.
pub fn collect_unit(source: &str) -> SourceUnit {
    DiscoveryEngine::default().collect("test_module.py", source, Some("test_module"))
}

/// Find the first node with the given name, depth-first in document order.
pub fn find_node<'a>(nodes: &'a [DiscoveryNode], name: &str) -> Option<&'a DiscoveryNode> {
    for node in nodes {
        if node.name == name {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, name) {
            return Some(found);
        }
    }
    None
}

/// Find a node by its exact nesting path.
pub fn find_path<'a>(nodes: &'a [DiscoveryNode], path: &[&str]) -> Option<&'a DiscoveryNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.iter().find(|n| n.name == *first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_path(&node.children, rest)
    }
}

/// Names of the direct method children of a class node.
pub fn method_names(node: &DiscoveryNode) -> Vec<&str> {
    node.children
        .iter()
        .filter(|child| child.kind == NodeKind::Method)
        .map(|child| child.name.as_str())
        .collect()
}

/// Assert a method node exists at `path` and has the expected skip state.
pub fn assert_method_skipped(discovery: &FileDiscovery, path: &[&str], skipped: bool) {
    let node = find_path(&discovery.nodes, path)
        .unwrap_or_else(|| panic!("expected method at path {:?}", path));
    assert_eq!(node.kind, NodeKind::Method, "node at {:?} is not a method", path);
    assert_eq!(
        node.is_skipped, skipped,
        "method at {:?} has wrong skip state",
        path
    );
}
