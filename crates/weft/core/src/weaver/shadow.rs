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

//! Shadows: the advice recorded at a woven join point

use serde::{Deserialize, Serialize};
use weft_common::JoinPoint;
use weft_compiler::{AdviceKey, AdviceKind, Bindings, Rank};

/// One advice applied at a shadow, with the captures of its match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadowAdvice {
    pub key: AdviceKey,
    pub kind: AdviceKind,
    pub rank: Rank,
    #[serde(default)]
    pub bindings: Bindings,
}

/// The static footprint of a join point in a woven unit
///
/// `advice` is kept sorted by rank, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub join_point: JoinPoint,
    pub advice: Vec<ShadowAdvice>,
}

impl Shadow {
    pub fn new(join_point: JoinPoint, advice: Vec<ShadowAdvice>) -> Self {
        let mut shadow = Self {
            join_point,
            advice: Vec::new(),
        };
        shadow.merge(advice);
        shadow
    }

    pub fn contains(&self, key: &AdviceKey) -> bool {
        self.advice.iter().any(|a| &a.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &AdviceKey> {
        self.advice.iter().map(|a| &a.key)
    }

    /// Add advice not already present and restore rank order
    ///
    /// Returns the number of advice added.
    pub fn merge(&mut self, advice: Vec<ShadowAdvice>) -> usize {
        let mut added = 0;
        for a in advice {
            if !self.contains(&a.key) {
                self.advice.push(a);
                added += 1;
            }
        }
        self.advice.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.key.cmp(&b.key)));
        added
    }
}
