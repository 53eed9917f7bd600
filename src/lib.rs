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

pub mod batch;
pub mod config;
pub mod core;
pub mod engine;
pub mod scanner;

pub use batch::{analyze_paths, detect_module_path, BatchFailure, BatchReport};
pub use config::DiscoveryConfig;
pub use crate::core::*;
pub use engine::DiscoveryEngine;
pub use scanner::*;

#[cfg(test)]
mod tests;
