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

//! Subcommands of the `weft` binary

pub mod inspect;
pub mod weave;

use anyhow::{Context, Result};
use std::path::Path;
use weft_core::Unit;

/// Read a JSON array of units
pub fn load_units(path: &Path) -> Result<Vec<Unit>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading units from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing units in {}", path.display()))
}
