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

//! Fast pre-filter for candidate test files.
//!
//! A regex check that skips files which definitely contain no unittest
//! constructs, avoiding a full parse. It errs on the side of false
//! positives: a match only means the file is worth parsing.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Quick check whether content might declare unittest tests.
pub fn might_contain_tests(content: &str) -> bool {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        // Intentionally broad: aliased imports still mention the module
        // name, and prefix-named defs cover unusual framework setups.
        Regex::new(r"(?i)\b(unittest|testcase|subtest)\b|\bdef\s+test").unwrap()
    });

    re.is_match(content)
}

/// Read a file and return its content if it might contain tests.
///
/// # Returns
/// * `Ok(Some(content))` - file content worth parsing
/// * `Ok(None)` - file cannot contain tests
/// * `Err(_)` - file cannot be read or is not valid UTF-8
pub fn scan_file(file_path: &str) -> Result<Option<String>> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {}", file_path))?;

    if might_contain_tests(&content) {
        Ok(Some(content))
    } else {
        Ok(None)
    }
}

/// Iterator that yields `(path, content)` for files passing the pre-filter.
pub fn find_files_with_tests<I>(file_paths: I) -> FindFilesIterator<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    FindFilesIterator {
        paths: file_paths.into_iter(),
    }
}

pub struct FindFilesIterator<I> {
    paths: I,
}

impl<I> Iterator for FindFilesIterator<I>
where
    I: Iterator,
    I::Item: AsRef<Path>,
{
    type Item = Result<(String, String)>; // (file_path, content)

    fn next(&mut self) -> Option<Self::Item> {
        for path in &mut self.paths {
            let path_str = path.as_ref().to_string_lossy().to_string();

            match scan_file(&path_str) {
                Ok(Some(content)) => return Some(Ok((path_str, content))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Recursively find Python files under a directory that pass the pre-filter.
pub fn find_python_files_with_tests(dir_path: &str) -> Result<Vec<(String, String)>> {
    let mut results = Vec::new();
    visit_directory(Path::new(dir_path), &mut results)?;
    Ok(results)
}

fn visit_directory(dir: &Path, results: &mut Vec<(String, String)>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            // Skip hidden directories and __pycache__
            if let Some(name) = path.file_name() {
                let name = name.to_string_lossy();
                if !name.starts_with('.') && name != "__pycache__" {
                    visit_directory(&path, results)?;
                }
            }
        } else if path.extension().is_some_and(|ext| ext == "py") {
            let path_str = path.to_string_lossy().to_string();
            if let Some(content) = scan_file(&path_str)? {
                results.push((path_str, content));
            }
        }
    }

    Ok(())
}
