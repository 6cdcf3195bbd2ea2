//! Cross-pass aggregation
//!
//! Every build pass that writes to an output target starts with
//! [`AggregationContext::begin_pass`] and ends with
//! [`AggregationContext::complete_pass`]. The number of outstanding tickets
//! for a target is its counter; the pass whose completion brings it to zero is
//! the final pass and the only one allowed to emit.
//!
//! Tickets carry a unique id, so completions may arrive in any order: each
//! retires exactly its own start.

use dashmap::DashMap;
use importmap_core::{ImportMapError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Proof that a pass was started for `target`
#[derive(Debug, PartialEq, Eq)]
pub struct PassTicket {
    target: PathBuf,
    id: Uuid,
}

impl PassTicket {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug)]
pub enum Completion {
    /// Other passes for the target are still running
    Pending { remaining: usize },
    /// This pass is the last one; `contributions` are the import maps
    /// deposited by the passes that completed before it, oldest first.
    /// `cycle` counts the cycles this context finished for the target
    /// before this one, so the first emission has cycle 0.
    Final {
        contributions: Vec<Value>,
        cycle: usize,
    },
}

impl Completion {
    pub fn is_final(&self) -> bool {
        matches!(self, Completion::Final { .. })
    }
}

#[derive(Debug, Default)]
struct TargetState {
    outstanding: Vec<Uuid>,
    contributions: Vec<Value>,
    completed_cycles: usize,
}

/// Pass counters per output target. Entries are never removed, so a target
/// stays recognizable as an import map output for the life of the context.
#[derive(Debug, Default)]
pub struct AggregationContext {
    targets: DashMap<PathBuf, TargetState>,
}

impl AggregationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&self, target: impl Into<PathBuf>) -> PassTicket {
        let target = target.into();
        let id = Uuid::new_v4();
        self.targets
            .entry(target.clone())
            .or_default()
            .outstanding
            .push(id);
        PassTicket { target, id }
    }

    /// Retire `ticket`. A non-final pass leaves `contribution` behind for the
    /// final one.
    pub fn complete_pass(&self, ticket: PassTicket, contribution: Value) -> Result<Completion> {
        let unknown = || ImportMapError::UnknownPass(ticket.id.to_string());
        let mut state = self.targets.get_mut(&ticket.target).ok_or_else(unknown)?;

        let position = state
            .outstanding
            .iter()
            .position(|id| *id == ticket.id)
            .ok_or_else(unknown)?;
        state.outstanding.remove(position);

        if state.outstanding.is_empty() {
            let cycle = state.completed_cycles;
            state.completed_cycles += 1;
            Ok(Completion::Final {
                contributions: std::mem::take(&mut state.contributions),
                cycle,
            })
        } else {
            state.contributions.push(contribution);
            Ok(Completion::Pending {
                remaining: state.outstanding.len(),
            })
        }
    }

    /// Passes still running for `target`; zero when idle or never seen
    pub fn outstanding(&self, target: &Path) -> usize {
        self.targets
            .get(target)
            .map_or(0, |state| state.outstanding.len())
    }

    /// Whether any pass has ever been started for `target`
    pub fn is_tracked(&self, target: &Path) -> bool {
        self.targets.contains_key(target)
    }
}
