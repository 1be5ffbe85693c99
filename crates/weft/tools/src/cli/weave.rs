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

//! `weft weave`: compile-time batch weaving

use super::load_units;
use crate::bodies::tracing_bodies;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use weft_common::Diagnostic;
use weft_compiler::WeaveConfig;
use weft_runtime::{CompileTimeWeaver, Session};

#[derive(Parser, Debug)]
pub struct WeaveArgs {
    /// Aspect configuration (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Units to weave (JSON array)
    #[arg(short, long)]
    pub units: PathBuf,

    /// Where to write the woven units; stdout when absent
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Advice body symbols the host provides (JSON array); all declared symbols when absent
    #[arg(long)]
    pub bodies: Option<PathBuf>,
}

/// Result of a weave run
#[derive(Debug)]
pub struct WeaveSummary {
    pub diagnostics: Vec<Diagnostic>,
    /// Units rewritten, `None` when the batch aborted
    pub woven: Option<usize>,
    /// Serialized woven units when no output file was given
    pub output: Option<String>,
}

impl WeaveSummary {
    pub fn succeeded(&self) -> bool {
        self.woven.is_some()
    }
}

pub fn run_weave(args: &WeaveArgs) -> Result<WeaveSummary> {
    let config = WeaveConfig::from_path(&args.config)?;
    let known: Option<Vec<String>> = match &args.bodies {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading body symbols from {}", path.display()))?;
            Some(serde_json::from_str(&text).context("body symbols must be a JSON array of strings")?)
        }
        None => None,
    };
    let units = load_units(&args.units)?;
    info!(units = units.len(), aspects = config.aspects.len(), "weaving batch");

    let advice = tracing_bodies(&config, known.as_deref());
    let session = Arc::new(Session::open(config, &advice)?);
    let weaver = CompileTimeWeaver::new(session);

    let batch = match weaver.weave_all(units.into_iter().map(Arc::new).collect()) {
        Ok(batch) => batch,
        Err(aborted) => {
            return Ok(WeaveSummary {
                diagnostics: aborted.diagnostics,
                woven: None,
                output: None,
            });
        }
    };

    let woven: Vec<_> = batch.units.iter().map(|u| u.as_ref()).collect();
    let json = serde_json::to_string_pretty(&woven)?;
    let output = match &args.out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing woven units to {}", path.display()))?;
            None
        }
        None => Some(json),
    };
    Ok(WeaveSummary {
        woven: Some(batch.woven()),
        diagnostics: batch.diagnostics,
        output,
    })
}
