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

//! Engine configuration: the well-known origins the classifier acts on.
//!
//! These are process-wide constants once an engine is built. Everything the
//! engine recognizes (the test-case base classes, the skip markers and the
//! test-name convention) is decided here and only here.

use once_cell::sync::Lazy;

use crate::core::types::{ConfigError, OriginKey};

/// The canonical `unittest` test-case bases. `unittest.case` is the defining
/// module, re-exported at package level, so both spellings are recognized.
static DEFAULT_TEST_BASES: Lazy<Vec<OriginKey>> = Lazy::new(|| {
    vec![
        OriginKey::absolute("unittest.TestCase"),
        OriginKey::absolute("unittest.case.TestCase"),
        OriginKey::absolute("unittest.IsolatedAsyncioTestCase"),
    ]
});

static DEFAULT_SKIP_MARKERS: Lazy<Vec<OriginKey>> = Lazy::new(|| {
    vec![
        OriginKey::absolute("unittest.skip"),
        OriginKey::absolute("unittest.skipIf"),
        OriginKey::absolute("unittest.skipUnless"),
        OriginKey::absolute("unittest.case.skip"),
        OriginKey::absolute("unittest.case.skipIf"),
        OriginKey::absolute("unittest.case.skipUnless"),
    ]
});

/// Django's unittest-derived test-case bases.
static DJANGO_TEST_BASES: Lazy<Vec<OriginKey>> = Lazy::new(|| {
    vec![
        OriginKey::absolute("django.test.TestCase"),
        OriginKey::absolute("django.test.TransactionTestCase"),
        OriginKey::absolute("django.test.SimpleTestCase"),
        OriginKey::absolute("django.test.LiveServerTestCase"),
    ]
});

const DEFAULT_TEST_NAME_PREFIX: &str = "test";

/// Recognized options of the discovery engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Canonical origins whose presence in a class's base closure makes it a
    /// test-case class.
    pub test_base_origins: Vec<OriginKey>,
    /// Canonical origins recognized as "disable" decorators.
    pub skip_marker_origins: Vec<OriginKey>,
    /// Prefix a method name must carry to qualify as a test.
    pub test_name_prefix: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            test_base_origins: DEFAULT_TEST_BASES.clone(),
            skip_marker_origins: DEFAULT_SKIP_MARKERS.clone(),
            test_name_prefix: DEFAULT_TEST_NAME_PREFIX.to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// Additionally recognize the Django test-case bases.
    pub fn with_django(mut self) -> Self {
        self.test_base_origins.extend(DJANGO_TEST_BASES.clone());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.test_name_prefix = prefix.to_string();
        self
    }

    /// Check the configuration before any file is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_base_origins.is_empty() {
            return Err(ConfigError::NoTestBases);
        }
        if self.test_name_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        for origin in self
            .test_base_origins
            .iter()
            .chain(&self.skip_marker_origins)
        {
            if origin.name.is_empty() || origin.module.iter().any(|segment| segment.is_empty()) {
                return Err(ConfigError::InvalidOrigin(origin.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DiscoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = DiscoveryConfig::default().with_prefix("");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPrefix)));
    }

    #[test]
    fn test_no_bases_rejected() {
        let mut config = DiscoveryConfig::default();
        config.test_base_origins.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoTestBases)));
    }

    #[test]
    fn test_malformed_origin_rejected() {
        let mut config = DiscoveryConfig::default();
        config.test_base_origins.push(OriginKey::absolute("a..B"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOrigin(_))
        ));
    }
}
