// Weft
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Declarative weave configuration
//!
//! Parsed once at session start. Aspects keep their declaration order, which
//! breaks precedence ties between advice of different aspects.

use crate::aspect::AdviceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A named pointcut declared by an aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPointcutDecl {
    pub name: String,
    pub pointcut: String,
}

/// One advice of an aspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceDecl {
    pub name: String,
    pub kind: AdviceKind,
    /// Pointcut expression text
    pub pointcut: String,
    /// Symbol of the advice body in the host's advice registry
    pub body: String,
    /// Explicit precedence; higher runs outer
    #[serde(default)]
    pub precedence: i32,
    /// Names the advice wants captured (`args(..)`, `this(..)`)
    #[serde(default)]
    pub bind: Vec<String>,
}

/// An aspect: ordered advice plus an aspect-level precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectDecl {
    pub name: String,
    #[serde(default)]
    pub precedence: i32,
    #[serde(default)]
    pub pointcuts: Vec<NamedPointcutDecl>,
    #[serde(default)]
    pub advice: Vec<AdviceDecl>,
}

impl AspectDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precedence: 0,
            pointcuts: Vec::new(),
            advice: Vec::new(),
        }
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_pointcut(mut self, name: impl Into<String>, pointcut: impl Into<String>) -> Self {
        self.pointcuts.push(NamedPointcutDecl {
            name: name.into(),
            pointcut: pointcut.into(),
        });
        self
    }

    pub fn with_advice(mut self, advice: AdviceDecl) -> Self {
        self.advice.push(advice);
        self
    }
}

impl AdviceDecl {
    pub fn new(name: impl Into<String>, kind: AdviceKind, pointcut: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            pointcut: pointcut.into(),
            body: body.into(),
            precedence: 0,
            bind: Vec::new(),
        }
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn binding(mut self, name: impl Into<String>) -> Self {
        self.bind.push(name.into());
        self
    }
}

/// Aspects plus the include/exclude type-name filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaveConfig {
    #[serde(default)]
    pub aspects: Vec<AspectDecl>,
    /// Type-name patterns of units offered for weaving; empty offers every unit
    #[serde(default)]
    pub include: Vec<String>,
    /// Type-name patterns of units never offered for weaving
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl WeaveConfig {
    /// Configuration with the given aspects and no filters
    pub fn with_aspects(aspects: Vec<AspectDecl>) -> Self {
        Self {
            aspects,
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&text)
    }

    /// Validate the configuration
    ///
    /// Pointcut text is not parsed here; syntax errors surface as diagnostics
    /// when aspects are constructed.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut aspect_names = BTreeSet::new();
        for aspect in &self.aspects {
            if aspect.name.trim().is_empty() {
                return Err(ConfigError::Invalid("aspect name must not be empty".to_string()));
            }
            if !aspect_names.insert(aspect.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate aspect `{}`", aspect.name)));
            }

            let mut pointcut_names = BTreeSet::new();
            for named in &aspect.pointcuts {
                if named.name.trim().is_empty() || named.pointcut.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("aspect `{}` declares an empty named pointcut", aspect.name)));
                }
                if !pointcut_names.insert(named.name.as_str()) {
                    return Err(ConfigError::Invalid(format!("aspect `{}` declares pointcut `{}` twice", aspect.name, named.name)));
                }
            }

            let mut advice_names = BTreeSet::new();
            for advice in &aspect.advice {
                if advice.name.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("aspect `{}` declares an unnamed advice", aspect.name)));
                }
                if !advice_names.insert(advice.name.as_str()) {
                    return Err(ConfigError::Invalid(format!("aspect `{}` declares advice `{}` twice", aspect.name, advice.name)));
                }
                if advice.pointcut.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("advice `{}.{}` has an empty pointcut", aspect.name, advice.name)));
                }
            }
        }

        for pattern in self.include.iter().chain(&self.exclude) {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Invalid("include/exclude patterns must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
