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

//! Batch discovery over many files.
//!
//! Each file is an independent, atomic unit of work: a file that cannot be
//! read is recorded as a failure and the batch continues. Syntax issues
//! inside a file never reach this level; they stay in that file's
//! diagnostics channel.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::types::FileDiscovery;
use crate::engine::DiscoveryEngine;
use crate::scanner::might_contain_tests;

/// A file the batch could not analyze at all (unreadable, not UTF-8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub path: String,
    pub error: String,
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileDiscovery>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another report into this one.
    pub fn update(&mut self, other: BatchReport) {
        self.files.extend(other.files);
        self.failures.extend(other.failures);
    }

    /// Total number of discovered test methods across all files.
    pub fn total_tests(&self) -> usize {
        self.files.iter().map(|f| f.test_ids().len()).sum()
    }
}

/// Analyze a list of files with one shared engine.
///
/// Files failing the pre-filter still get an (empty) entry, so callers see
/// every file accounted for.
pub fn analyze_paths<P: AsRef<Path>>(engine: &DiscoveryEngine, paths: &[P]) -> BatchReport {
    let mut report = BatchReport::new();

    for path in paths {
        let path = path.as_ref();
        let file_id = path.to_string_lossy().to_string();

        let source = match read_source(path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", file_id, e);
                report.failures.push(BatchFailure {
                    path: file_id,
                    error: format!("{:#}", e),
                });
                continue;
            }
        };

        let module = detect_module_path(path);
        let discovery = if might_contain_tests(&source) {
            engine.analyze(&file_id, &source, module.as_deref())
        } else {
            FileDiscovery {
                file_id,
                module,
                nodes: Vec::new(),
                diagnostics: Vec::new(),
            }
        };
        report.files.push(discovery);
    }

    report
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Derive the package-relative module path of a file by walking `__init__.py`
/// packages upward, e.g. `pkg/sub/test_mod.py` becomes `pkg.sub.test_mod`.
pub fn detect_module_path(file_path: &Path) -> Option<String> {
    let mut module_parts = Vec::new();

    if let Some(stem) = file_path.file_stem() {
        if stem != "__init__" {
            module_parts.push(stem.to_string_lossy().into_owned());
        }
    }

    let mut current_dir = file_path.parent()?;
    loop {
        if !current_dir.join("__init__.py").exists() {
            break;
        }

        if let Some(package_name) = current_dir.file_name() {
            module_parts.insert(0, package_name.to_string_lossy().into_owned());
        }

        match current_dir.parent() {
            Some(parent) if parent != current_dir => current_dir = parent,
            _ => break,
        }
    }

    if module_parts.is_empty() {
        None
    } else {
        Some(module_parts.join("."))
    }
}
