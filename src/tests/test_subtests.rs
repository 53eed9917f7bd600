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

//! Tests for sub-test site recognition.

use crate::core::types::{NodeKind, SubTestLabel};
use crate::tests::common::{collect_unit, discover, find_path};

#[test]
fn test_three_sequential_subtests_in_order() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_sub_test(self):
        with self.subTest("foo"):
            self.assertTrue(True)

        with self.subTest("bar"):
            self.assertTrue(True)

        with self.subTest("baz"):
            self.assertTrue(True)
"#;
    let discovery = discover(source);

    let method = find_path(&discovery.nodes, &["T", "test_sub_test"]).unwrap();
    let labels: Vec<&str> = method
        .children
        .iter()
        .map(|child| {
            assert_eq!(child.kind, NodeKind::SubTest);
            child.name.as_str()
        })
        .collect();
    assert_eq!(labels, vec!["foo", "bar", "baz"]);
}

#[test]
fn test_computed_label_recorded_as_opaque() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_dynamic(self):
        for i in range(3):
            with self.subTest(i):
                self.assertTrue(True)
"#;
    let unit = collect_unit(source);

    let method = unit
        .decls
        .iter()
        .find(|d| d.name == "test_dynamic")
        .unwrap();
    let crate::core::types::DeclKind::Function { subtests } = &method.kind else {
        panic!("expected a function declaration");
    };
    // One declared site, however many times the loop runs
    assert_eq!(subtests.len(), 1);
    assert_eq!(subtests[0].label, SubTestLabel::Computed("i".to_string()));
}

#[test]
fn test_keyword_only_subtest_has_empty_label() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_params(self):
        with self.subTest(x=1):
            self.assertTrue(True)
"#;
    let unit = collect_unit(source);

    let method = unit.decls.iter().find(|d| d.name == "test_params").unwrap();
    let crate::core::types::DeclKind::Function { subtests } = &method.kind else {
        panic!("expected a function declaration");
    };
    assert_eq!(subtests[0].label, SubTestLabel::Empty);
}

#[test]
fn test_number_literal_label() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_numbered(self):
        with self.subTest(42):
            self.assertTrue(True)
"#;
    let unit = collect_unit(source);

    let method = unit
        .decls
        .iter()
        .find(|d| d.name == "test_numbered")
        .unwrap();
    let crate::core::types::DeclKind::Function { subtests } = &method.kind else {
        panic!("expected a function declaration");
    };
    assert_eq!(subtests[0].label, SubTestLabel::Literal("42".to_string()));
}

#[test]
fn test_nested_subtest_sites_all_recorded() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_nested(self):
        with self.subTest("outer"):
            with self.subTest("inner"):
                self.assertTrue(True)
"#;
    let discovery = discover(source);

    let method = find_path(&discovery.nodes, &["T", "test_nested"]).unwrap();
    let labels: Vec<&str> = method.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(labels, vec!["outer", "inner"]);
}

#[test]
fn test_other_with_blocks_not_confused_for_subtests() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def test_resources(self):
        with open("data.txt") as f:
            pass
        with self.assertRaises(ValueError):
            pass
        with self.subTest("real"):
            pass
"#;
    let discovery = discover(source);

    let method = find_path(&discovery.nodes, &["T", "test_resources"]).unwrap();
    assert_eq!(method.children.len(), 1);
    assert_eq!(method.children[0].name, "real");
}

#[test]
fn test_subtests_only_surface_under_test_methods() {
    let source = r#"
import unittest

class T(unittest.TestCase):
    def helper(self):
        with self.subTest("hidden"):
            pass

    def test_visible(self):
        with self.subTest("shown"):
            pass
"#;
    let discovery = discover(source);

    assert!(find_path(&discovery.nodes, &["T", "helper"]).is_none());
    let method = find_path(&discovery.nodes, &["T", "test_visible"]).unwrap();
    assert_eq!(method.children[0].name, "shown");
}
