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

//! Tests for catalog assembly: ordering, pruning and output shape.

use crate::core::types::NodeKind;
use crate::tests::common::{discover, find_node};

#[test]
fn test_nodes_in_document_order() {
    let source = r#"
import unittest

class Zebra(unittest.TestCase):
    def test_z(self):
        pass

class Alpha(unittest.TestCase):
    def test_c(self):
        pass

    def test_a(self):
        pass

    def test_b(self):
        pass
"#;
    let discovery = discover(source);

    let class_names: Vec<&str> = discovery.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(class_names, vec!["Zebra", "Alpha"]);

    // Methods keep declaration order, not name order
    let alpha = find_node(&discovery.nodes, "Alpha").unwrap();
    let methods: Vec<&str> = alpha.children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(methods, vec!["test_c", "test_a", "test_b"]);
}

#[test]
fn test_plain_leaf_classes_are_dropped() {
    let source = r#"
import unittest

class Helpers:
    def shared(self):
        pass

class T(unittest.TestCase):
    def test_x(self):
        pass
"#;
    let discovery = discover(source);

    assert!(find_node(&discovery.nodes, "Helpers").is_none());
    assert!(find_node(&discovery.nodes, "T").is_some());
}

#[test]
fn test_non_test_base_class_kept_when_it_hosts_tests() {
    // A plain container is kept as a structural node because a test class
    // lives beneath it; it is marked as not-a-test-case itself.
    let source = r#"
import unittest

class Grouping:
    class First(unittest.TestCase):
        def test_1(self):
            pass

    class Second(unittest.TestCase):
        def test_2(self):
            pass
"#;
    let discovery = discover(source);

    let grouping = find_node(&discovery.nodes, "Grouping").unwrap();
    assert!(!grouping.is_test_case);
    assert_eq!(grouping.children.len(), 2);
    assert_eq!(grouping.children[0].name, "First");
    assert_eq!(grouping.children[1].name, "Second");
}

#[test]
fn test_node_kinds_and_positions() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_x(self):
        with self.subTest("s"):
            pass
"#;
    let discovery = discover(source);

    let class = find_node(&discovery.nodes, "T").unwrap();
    assert_eq!(class.kind, NodeKind::Class);
    assert_eq!(class.position.line, 4);

    let method = &class.children[0];
    assert_eq!(method.kind, NodeKind::Method);
    assert_eq!(method.position.line, 5);

    let subtest = &method.children[0];
    assert_eq!(subtest.kind, NodeKind::SubTest);
    assert_eq!(subtest.position.line, 6);
}

#[test]
fn test_file_identity_echoed_into_result() {
    let engine = crate::engine::DiscoveryEngine::default();
    let discovery = engine.analyze("some/dir/test_widgets.py", "", Some("pkg.test_widgets"));

    assert_eq!(discovery.file_id, "some/dir/test_widgets.py");
    assert_eq!(discovery.module.as_deref(), Some("pkg.test_widgets"));
}

#[test]
fn test_json_output_shape() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_x(self):
        pass
"#;
    let discovery = discover(source);
    let json = serde_json::to_value(&discovery).unwrap();

    assert_eq!(json["file_id"], "test_module.py");
    assert_eq!(json["nodes"][0]["kind"], "class");
    assert_eq!(json["nodes"][0]["is_test_case"], true);
    assert_eq!(json["nodes"][0]["children"][0]["kind"], "method");
    assert_eq!(json["nodes"][0]["children"][0]["name"], "test_x");
}
