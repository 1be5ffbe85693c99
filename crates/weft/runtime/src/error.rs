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

use thiserror::Error;
use weft_compiler::{ConfigError, PointcutSyntaxError};
use weft_core::WeaveError;

use crate::strategy::BatchAborted;

/// Errors raised while opening a session or delivering woven units
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid {list} pattern `{pattern}`: {source}")]
    Filter {
        list: &'static str,
        pattern: String,
        #[source]
        source: PointcutSyntaxError,
    },

    #[error("Weave error: {0}")]
    Weave(#[from] WeaveError),

    #[error(transparent)]
    Aborted(#[from] BatchAborted),
}

impl RuntimeError {
    /// Get error category for reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Filter { .. } => "filter",
            Self::Weave(e) => e.category(),
            Self::Aborted(_) => "batch",
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
