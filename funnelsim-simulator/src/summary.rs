//! Run summary and state digest.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use funnelsim_core::{Event, EventType};
use serde::Serialize;

/// Per-variant outcome of an experiment in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariantStats {
    pub users: usize,
    pub purchasers: usize,
}

impl VariantStats {
    pub fn purchase_rate(&self) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            self.purchasers as f64 / self.users as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_events: usize,
    pub by_type: BTreeMap<EventType, usize>,
    pub visitors: usize,
    pub signups: usize,
    pub purchasers: usize,
    pub variants: BTreeMap<String, VariantStats>,
    /// See [`run_digest`].
    pub digest: String,
}

impl RunSummary {
    pub fn from_events(events: &[Event]) -> Self {
        let mut by_type = BTreeMap::new();
        let mut visitors = HashSet::new();
        let mut signups = HashSet::new();
        let mut purchasers = HashSet::new();
        let mut assigned: BTreeMap<&str, &str> = BTreeMap::new();

        for event in events {
            *by_type.entry(event.event_type).or_insert(0) += 1;
            let user = event.user_id.as_str();
            match event.event_type {
                EventType::PageView => {
                    visitors.insert(user);
                }
                EventType::Signup => {
                    signups.insert(user);
                }
                EventType::Purchase => {
                    purchasers.insert(user);
                }
                EventType::ExperimentAssignment => {
                    if let Some(variant) = event.text("variant") {
                        assigned.insert(user, variant);
                    }
                }
                EventType::Click => {}
            }
        }

        let mut variants: BTreeMap<String, VariantStats> = BTreeMap::new();
        for (user, variant) in assigned {
            let stats = variants.entry(variant.to_owned()).or_default();
            stats.users += 1;
            if purchasers.contains(user) {
                stats.purchasers += 1;
            }
        }

        Self {
            total_events: events.len(),
            by_type,
            visitors: visitors.len(),
            signups: signups.len(),
            purchasers: purchasers.len(),
            variants,
            digest: run_digest(events),
        }
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.by_type.get(&event_type).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation Summary ===")?;
        writeln!(f, "Events: {}", self.total_events)?;
        for ty in EventType::ALL {
            writeln!(f, "  {:<24} {}", ty.as_str(), self.count(ty))?;
        }
        writeln!(
            f,
            "Funnel: {} visitors -> {} signups -> {} purchasers",
            self.visitors, self.signups, self.purchasers
        )?;
        for (name, stats) in &self.variants {
            writeln!(
                f,
                "  variant {:<12} users={:<6} purchasers={:<6} rate={:.2}%",
                name,
                stats.users,
                stats.purchasers,
                stats.purchase_rate() * 100.0
            )?;
        }
        write!(f, "Digest: {}", self.digest)
    }
}

/// BLAKE3 over event id, user id and type of every event, in order.
///
/// Timestamps are left out so the digest depends only on the seed and the
/// configuration, not on when the run was made.
pub fn run_digest(events: &[Event]) -> String {
    let mut hasher = blake3::Hasher::new();
    for event in events {
        hasher.update(event.event_id.as_bytes());
        hasher.update(b"|");
        hasher.update(event.user_id.as_bytes());
        hasher.update(b"|");
        hasher.update(event.event_type.as_str().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize().as_bytes())
}
