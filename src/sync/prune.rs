// src/sync/prune.rs

//! Prune: keep only the newest ebuild per channel

use super::Synchronizer;
use crate::channel::Channel;
use crate::error::Result;
use crate::version::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Which channels a prune run may touch
#[derive(Debug, Clone, Copy)]
pub enum PruneGate<'r> {
    /// Every channel
    All,
    /// Only channels whose newest ebuild is the version listed as passing
    Passed(&'r BTreeMap<Channel, Version>),
}

/// Result of a prune run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Dropped versions per touched channel, oldest first
    pub dropped: BTreeMap<Channel, Vec<Version>>,
    /// Channels the gate excluded
    pub skipped: Vec<Channel>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }
}

impl<'a> Synchronizer<'a> {
    /// Remove all but the newest ebuild of each eligible channel
    ///
    /// The newest ebuild always survives, so no channel is ever left empty.
    pub fn prune(&self, gate: PruneGate<'_>) -> Result<PruneReport> {
        let mut report = PruneReport::default();

        for channel in Channel::ALL {
            let mut recipes = self.store.list(channel)?;
            let Some(newest) = recipes.pop() else {
                continue;
            };

            if let PruneGate::Passed(passed) = gate {
                if passed.get(&channel) != Some(&newest.version) {
                    info!(
                        "Not pruning {}: {} has no passing test result",
                        channel, newest.version
                    );
                    report.skipped.push(channel);
                    continue;
                }
            }

            if recipes.is_empty() {
                continue;
            }

            let mut dropped = Vec::with_capacity(recipes.len());
            for recipe in recipes {
                self.store.remove(channel, &recipe.version)?;
                dropped.push(recipe.version);
            }
            self.reconciler.reconcile(channel)?;
            self.commit_channel(channel, &[], &dropped)?;

            info!(
                "Pruned {} ebuild(s) from {}, kept {}",
                dropped.len(),
                channel,
                newest.version
            );
            report.dropped.insert(channel, dropped);
        }

        Ok(report)
    }
}
