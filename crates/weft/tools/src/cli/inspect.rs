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

//! `weft join-points` and `weft match`: inspecting units against pointcuts

use super::load_units;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use weft_compiler::pointcut::evaluate;
use weft_compiler::{NamedPointcuts, PatternCompiler, PointcutSyntaxError};
use weft_core::weaver::enumerate;

#[derive(Parser, Debug)]
pub struct JoinPointsArgs {
    /// Units to inspect (JSON array)
    #[arg(short, long)]
    pub units: PathBuf,
}

#[derive(Parser, Debug)]
pub struct MatchArgs {
    /// Pointcut expression to probe
    #[arg(short, long)]
    pub pointcut: String,

    /// Units to inspect (JSON array)
    #[arg(short, long)]
    pub units: PathBuf,

    /// Binding names the pointcut may capture
    #[arg(short, long)]
    pub bind: Vec<String>,
}

/// One line per join point of every unit
pub fn run_join_points(args: &JoinPointsArgs) -> Result<Vec<String>> {
    let units = load_units(&args.units)?;
    Ok(units
        .iter()
        .flat_map(|unit| enumerate(unit).into_iter().map(move |jp| format!("{}\t{}", unit.name, jp)))
        .collect())
}

/// Matching join points, or the syntax error of the pointcut
pub fn run_match(args: &MatchArgs) -> Result<Result<Vec<String>, PointcutSyntaxError>> {
    let compiled = match PatternCompiler::new().compile(&args.pointcut, &args.bind, &NamedPointcuts::new()) {
        Ok(compiled) => compiled,
        Err(e) => return Ok(Err(e)),
    };
    let units = load_units(&args.units)?;

    let mut lines = Vec::new();
    for unit in &units {
        for jp in enumerate(unit) {
            let result = evaluate(&compiled, &jp);
            if !result.matched {
                continue;
            }
            let bindings: Vec<String> = result.bindings.iter().map(|(name, source)| format!("{}={:?}", name, source)).collect();
            if bindings.is_empty() {
                lines.push(format!("{}\t{}", unit.name, jp));
            } else {
                lines.push(format!("{}\t{}\t{}", unit.name, jp, bindings.join(",")));
            }
        }
    }
    Ok(Ok(lines))
}
