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

//! Tests for the batch runner and module-path detection.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::batch::{analyze_paths, detect_module_path};
use crate::engine::DiscoveryEngine;

/// Helper to create a Python module file
fn create_module(dir: &std::path::Path, rel_path: &str, content: &str) -> PathBuf {
    let full_path = dir.join(rel_path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full_path, content).unwrap();
    full_path
}

#[test]
fn test_batch_continues_past_unreadable_file() {
    let temp_dir = TempDir::new().unwrap();
    let good = create_module(
        temp_dir.path(),
        "test_good.py",
        "import unittest\n\nclass T(unittest.TestCase):\n    def test_ok(self):\n        pass\n",
    );
    let missing = temp_dir.path().join("does_not_exist.py");

    let engine = DiscoveryEngine::default();
    let report = analyze_paths(&engine, &[missing, good]);

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.contains("does_not_exist"));
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.total_tests(), 1);
}

#[test]
fn test_batch_prefiltered_file_gets_empty_entry() {
    let temp_dir = TempDir::new().unwrap();
    let helper = create_module(temp_dir.path(), "helpers.py", "def shared():\n    pass\n");

    let engine = DiscoveryEngine::default();
    let report = analyze_paths(&engine, &[helper]);

    assert_eq!(report.files.len(), 1);
    assert!(report.files[0].nodes.is_empty());
    assert!(report.files[0].diagnostics.is_empty());
}

#[test]
fn test_module_path_detected_through_packages() {
    let temp_dir = TempDir::new().unwrap();
    create_module(temp_dir.path(), "pkg/__init__.py", "");
    create_module(temp_dir.path(), "pkg/sub/__init__.py", "");
    let test_file = create_module(
        temp_dir.path(),
        "pkg/sub/test_things.py",
        "import unittest\n\nclass T(unittest.TestCase):\n    def test_x(self):\n        pass\n",
    );

    assert_eq!(
        detect_module_path(&test_file).as_deref(),
        Some("pkg.sub.test_things")
    );

    let engine = DiscoveryEngine::default();
    let report = analyze_paths(&engine, &[test_file]);

    let ids: Vec<String> = report.files[0]
        .test_ids()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec!["pkg.sub.test_things.T.test_x"]);
}

#[test]
fn test_module_path_of_standalone_file_is_stem() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = create_module(temp_dir.path(), "test_alone.py", "");

    assert_eq!(detect_module_path(&test_file).as_deref(), Some("test_alone"));
}

#[test]
fn test_batch_relative_imports_resolve_against_package() {
    let temp_dir = TempDir::new().unwrap();
    create_module(temp_dir.path(), "pkg/__init__.py", "");
    create_module(
        temp_dir.path(),
        "pkg/bases.py",
        "import unittest\n\nclass AppTestCase(unittest.TestCase):\n    pass\n",
    );
    let test_file = create_module(
        temp_dir.path(),
        "pkg/test_app.py",
        "from unittest import TestCase\nfrom .helpers import oddity\n\nclass T(TestCase):\n    def test_x(self):\n        pass\n",
    );

    let engine = DiscoveryEngine::default();
    let report = analyze_paths(&engine, &[test_file]);

    assert!(report.failures.is_empty());
    assert_eq!(report.files[0].module.as_deref(), Some("pkg.test_app"));
    assert_eq!(report.total_tests(), 1);
}

#[test]
fn test_batch_report_merge() {
    let temp_dir = TempDir::new().unwrap();
    let a = create_module(
        temp_dir.path(),
        "test_a.py",
        "import unittest\n\nclass A(unittest.TestCase):\n    def test_a(self):\n        pass\n",
    );
    let b = create_module(
        temp_dir.path(),
        "test_b.py",
        "import unittest\n\nclass B(unittest.TestCase):\n    def test_b(self):\n        pass\n",
    );

    let engine = DiscoveryEngine::default();
    let mut report = analyze_paths(&engine, &[a]);
    report.update(analyze_paths(&engine, &[b]));

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.total_tests(), 2);
}
