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

//! Command-line interface for the unearth tool.
//!
//! This binary provides the entry point for the unearth CLI, which offers
//! commands for:
//!
//! - `discover`: Print the per-file discovery tree of unittest test classes,
//!   test methods and sub-test sites, as text or JSON.
//! - `list`: Print flat dotted test identifiers, one per line, the way a
//!   runner would address them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use unearth_python::core::types::{DiscoveryNode, FileDiscovery, NodeKind};
use unearth_python::{analyze_paths, BatchReport, DiscoveryConfig, DiscoveryEngine};

#[derive(Parser)]
#[command(name = "unearth")]
#[command(about = "Unearth - Static discovery of Python unittest tests")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the discovery tree for Python files or directories
    Discover {
        /// Python files, directories or glob patterns to analyze
        paths: Vec<String>,

        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,

        /// Also recognize the Django test-case base classes
        #[arg(long)]
        django: bool,

        /// Method name prefix that qualifies a test (default: test)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Print flat dotted test identifiers, one per line
    List {
        /// Python files, directories or glob patterns to analyze
        paths: Vec<String>,

        /// Also recognize the Django test-case base classes
        #[arg(long)]
        django: bool,

        /// Method name prefix that qualifies a test (default: test)
        #[arg(long)]
        prefix: Option<String>,

        /// Include skipped tests in the listing
        #[arg(long)]
        skipped: bool,
    },
}

/// Discover Python files in a directory or resolve a path argument
fn discover_python_files(path: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(path);

    // If it's already a Python file, return it
    if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
        return Ok(vec![path.to_path_buf()]);
    }

    // If it's a directory, scan recursively for Python files
    if path.is_dir() {
        let mut python_files = Vec::new();
        visit_python_files(path, &mut python_files)?;
        python_files.sort();
        return Ok(python_files);
    }

    // Try glob pattern matching for file paths
    if path.to_string_lossy().contains('*') || path.to_string_lossy().contains('?') {
        let pattern = path.to_string_lossy();
        let glob_results = glob::glob(&pattern)?;
        let mut files = Vec::new();
        for entry in glob_results {
            let entry = entry?;
            if entry.extension().is_some_and(|ext| ext == "py") {
                files.push(entry);
            }
        }
        files.sort();
        return Ok(files);
    }

    // Fall back to treating it as a file path (may not exist)
    Ok(vec![path.to_path_buf()])
}

fn visit_python_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                // Skip hidden directories and __pycache__
                if let Some(name) = path.file_name() {
                    let name = name.to_string_lossy();
                    if !name.starts_with('.') && name != "__pycache__" {
                        visit_python_files(&path, files)?;
                    }
                }
            } else if path.extension().is_some_and(|ext| ext == "py") {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Expand a list of path arguments into a deduplicated file list
fn expand_paths(paths: &[String]) -> Result<Vec<PathBuf>> {
    use indexmap::IndexSet;

    let mut expanded = IndexSet::new();
    for path in paths {
        expanded.extend(discover_python_files(path)?);
    }

    Ok(expanded.into_iter().collect())
}

fn build_engine(django: bool, prefix: Option<&str>) -> Result<DiscoveryEngine> {
    let mut config = DiscoveryConfig::default();
    if django {
        config = config.with_django();
    }
    if let Some(prefix) = prefix {
        config = config.with_prefix(prefix);
    }
    Ok(DiscoveryEngine::new(config)?)
}

fn print_node(node: &DiscoveryNode, indent: usize) {
    let pad = "  ".repeat(indent);
    let kind = match node.kind {
        NodeKind::Class => {
            if node.is_test_case {
                "test class"
            } else {
                "container"
            }
        }
        NodeKind::Method => "test",
        NodeKind::SubTest => "subtest",
    };
    let skipped = if node.is_skipped { " (skipped)" } else { "" };
    println!(
        "{}{} [{}]{} @ {}",
        pad, node.name, kind, skipped, node.position
    );
    for child in &node.children {
        print_node(child, indent + 1);
    }
}

fn print_discovery(file: &FileDiscovery) {
    println!("{}:", file.file_id);
    if file.nodes.is_empty() {
        println!("  (no tests)");
    }
    for node in &file.nodes {
        print_node(node, 1);
    }
    for diagnostic in &file.diagnostics {
        eprintln!(
            "{}:{}: warning: {}",
            file.file_id, diagnostic.position, diagnostic.message
        );
    }
}

fn report_failures(report: &BatchReport) -> bool {
    for failure in &report.failures {
        eprintln!("{}: error: {}", failure.path, failure.error);
    }
    !report.failures.is_empty()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    if cli.debug || std::env::var("RUST_LOG").is_ok() {
        let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if cli.debug {
                    tracing_subscriber::EnvFilter::new("debug")
                } else {
                    tracing_subscriber::EnvFilter::new("warn")
                }
            }
        };
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .init();
    }

    let exit_code = match cli.command {
        Commands::Discover {
            paths,
            json,
            django,
            prefix,
        } => {
            let engine = build_engine(django, prefix.as_deref())?;
            let files = expand_paths(&paths)?;
            let report = analyze_paths(&engine, &files);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for file in &report.files {
                    print_discovery(file);
                }
                println!("{} test(s) discovered", report.total_tests());
            }

            if report_failures(&report) {
                1
            } else {
                0
            }
        }

        Commands::List {
            paths,
            django,
            prefix,
            skipped,
        } => {
            let engine = build_engine(django, prefix.as_deref())?;
            let files = expand_paths(&paths)?;
            let report = analyze_paths(&engine, &files);

            for file in &report.files {
                for (id, is_skipped) in file.test_ids() {
                    if is_skipped && !skipped {
                        continue;
                    }
                    if is_skipped {
                        println!("{} (skipped)", id);
                    } else {
                        println!("{}", id);
                    }
                }
            }

            if report_failures(&report) {
                1
            } else {
                0
            }
        }
    };

    std::process::exit(exit_code);
}
