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

//! Per-file import resolution table.
//!
//! The table is an append-then-shadow log replayed in document order: every
//! import statement appends bindings, and a later binding of the same local
//! name shadows the earlier one. Wildcard imports do not enumerate concrete
//! bindings; they are kept as separate facts consulted only as a
//! low-confidence fallback.

use indexmap::IndexMap;

use crate::core::types::{Origin, OriginKey, SourcePosition};

/// One local name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// The name visible in the file (the alias when one was given).
    pub local: String,
    pub origin: Origin,
    pub position: SourcePosition,
}

impl ImportBinding {
    /// Canonical key for this binding followed by an attribute chain.
    ///
    /// `chain` is empty when the local name itself is referenced; for a
    /// dotted reference like `ut.TestCase` it holds the trailing segments.
    pub fn canonical_key(&self, chain: &[String]) -> OriginKey {
        let mut parts = self.origin.referent();
        parts.extend(chain.iter().cloned());
        // referent() is never empty, so from_parts always succeeds
        OriginKey::from_parts(self.origin.level, parts).expect("non-empty referent")
    }
}

/// An open `from X import *` fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardImport {
    pub module: Vec<String>,
    pub level: u32,
    pub position: SourcePosition,
}

impl WildcardImport {
    /// Tentative key attributing `name` to this wildcard source.
    pub fn attributed_key(&self, name: &str) -> OriginKey {
        OriginKey {
            module: self.module.clone(),
            level: self.level,
            name: name.to_string(),
        }
    }
}

/// The import log of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    log: Vec<ImportBinding>,
    wildcards: Vec<WildcardImport>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plain `import a.b.c [as x]` statement.
    pub fn record_plain(&mut self, dotted: &str, alias: Option<&str>, position: SourcePosition) {
        let module: Vec<String> = dotted.split('.').map(str::to_string).collect();
        let local = match alias {
            Some(alias) => alias.to_string(),
            None => module[0].clone(),
        };
        self.log.push(ImportBinding {
            local,
            origin: Origin {
                module,
                level: 0,
                name: dotted.to_string(),
                alias: alias.map(str::to_string),
                module_import: true,
            },
            position,
        });
    }

    /// Record one name of a `from X import A [as b]` statement.
    pub fn record_from(
        &mut self,
        module: &[String],
        level: u32,
        name: &str,
        alias: Option<&str>,
        position: SourcePosition,
    ) {
        let local = alias.unwrap_or(name).to_string();
        self.log.push(ImportBinding {
            local,
            origin: Origin {
                module: module.to_vec(),
                level,
                name: name.to_string(),
                alias: alias.map(str::to_string),
                module_import: false,
            },
            position,
        });
    }

    /// Record a `from X import *` statement.
    pub fn record_wildcard(&mut self, module: &[String], level: u32, position: SourcePosition) {
        self.wildcards.push(WildcardImport {
            module: module.to_vec(),
            level,
            position,
        });
    }

    /// The binding a local name resolves to: sequential rebinding means the
    /// last declaration wins.
    pub fn lookup(&self, local: &str) -> Option<&ImportBinding> {
        self.log.iter().rev().find(|b| b.local == local)
    }

    /// The most recent wildcard source, if any.
    pub fn last_wildcard(&self) -> Option<&WildcardImport> {
        self.wildcards.last()
    }

    /// The full log in document order, shadowed bindings included.
    pub fn bindings(&self) -> &[ImportBinding] {
        &self.log
    }

    pub fn wildcards(&self) -> &[WildcardImport] {
        &self.wildcards
    }

    /// The bindings visible at end of file, first-appearance order.
    pub fn active_bindings(&self) -> IndexMap<&str, &ImportBinding> {
        let mut map = IndexMap::new();
        for binding in &self.log {
            map.insert(binding.local.as_str(), binding);
        }
        map
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty() && self.wildcards.is_empty()
    }
}
