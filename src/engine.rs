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

//! The discovery engine facade.
//!
//! Ties the pipeline together: collection, hierarchy resolution,
//! classification and catalog assembly. Each call is stateless per file; an
//! engine is cheap to share across a batch.

use crate::config::DiscoveryConfig;
use crate::core::catalog::build_catalog;
use crate::core::classify::classify_unit;
use crate::core::collector::SourceCollector;
use crate::core::types::{ConfigError, FileDiscovery, SourceUnit};

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
}

impl Default for DiscoveryEngine {
    fn default() -> Self {
        // The built-in defaults always validate.
        Self {
            config: DiscoveryConfig::default(),
        }
    }
}

impl DiscoveryEngine {
    /// Build an engine, rejecting invalid configuration before any file is
    /// processed.
    pub fn new(config: DiscoveryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Analyze one file.
    ///
    /// `file_id` is an opaque identifier echoed into the result; `module` is
    /// the optional package-relative module path (e.g. `pkg.test_mod`), used
    /// only to absolutize relative-import origins. Analysis never fails: an
    /// unparseable file yields an empty tree plus diagnostics.
    pub fn analyze(&self, file_id: &str, source: &str, module: Option<&str>) -> FileDiscovery {
        let unit = self.collect(file_id, source, module);
        self.discover(&unit)
    }

    /// Parse and collect a file without classifying it. Exposed for callers
    /// that want to inspect the declaration tree or import table.
    pub fn collect(&self, file_id: &str, source: &str, module: Option<&str>) -> SourceUnit {
        SourceCollector::new(file_id, module, source).collect()
    }

    /// Classify an already collected unit and assemble its catalog.
    pub fn discover(&self, unit: &SourceUnit) -> FileDiscovery {
        let classes = classify_unit(unit, &self.config);
        let discovery = build_catalog(unit, &classes);
        tracing::debug!(
            "{}: {} test(s) discovered, {} diagnostic(s)",
            discovery.file_id,
            discovery.test_ids().len(),
            discovery.diagnostics.len()
        );
        discovery
    }
}
