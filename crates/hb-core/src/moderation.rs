//! Dashboard-side moderation state.
//!
//! `ModerationBoard` owns the active list, the archive list and the counters
//! shown above them. Each operation applies the same local change the
//! dashboard makes after the matching API call succeeds. Unknown ids are no-ops.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ArchivedConfession, Confession, Stats, DEFAULT_ARCHIVER};
use crate::sanitize::decode;

/// Which part of the active list to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Unread,
    Read,
}

impl FilterMode {
    pub fn keeps(self, confession: &Confession) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Unread => !confession.is_read,
            FilterMode::Read => confession.is_read,
        }
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FilterMode::All),
            "unread" => Ok(FilterMode::Unread),
            "read" => Ok(FilterMode::Read),
            other => Err(format!("unknown filter mode: {other}")),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterMode::All => "all",
            FilterMode::Unread => "unread",
            FilterMode::Read => "read",
        };
        f.write_str(s)
    }
}

/// Keeps the entries of `list` selected by `mode`, preserving order.
pub fn filter(list: &[Confession], mode: FilterMode) -> Vec<&Confession> {
    list.iter().filter(|c| mode.keeps(c)).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModerationBoard {
    active: Vec<Confession>,
    archived: Vec<ArchivedConfession>,
    stats: Stats,
}

impl ModerationBoard {
    pub fn new(active: Vec<Confession>, archived: Vec<ArchivedConfession>, stats: Stats) -> Self {
        Self {
            active,
            archived,
            stats,
        }
    }

    /// Builds a board from fetched API responses, decoding stored content for display.
    pub fn load(confessions: Vec<Confession>, stats: Stats) -> Self {
        let active = confessions
            .into_iter()
            .map(|mut c| {
                c.content = decode(&c.content);
                c
            })
            .collect();
        Self::new(active, Vec::new(), stats)
    }

    pub fn active(&self) -> &[Confession] {
        &self.active
    }

    pub fn archived(&self) -> &[ArchivedConfession] {
        &self.archived
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn filtered(&self, mode: FilterMode) -> Vec<&Confession> {
        filter(&self.active, mode)
    }

    pub fn archive(&mut self, id: Uuid) {
        let Some(pos) = self.active.iter().position(|c| c.id == id) else {
            return;
        };
        let confession = self.active.remove(pos);
        self.stats.total -= 1;
        if !confession.is_read {
            self.stats.unread -= 1;
        }
        self.archived
            .push(ArchivedConfession::from_confession(confession, DEFAULT_ARCHIVER));
    }

    pub fn unarchive(&mut self, id: Uuid) {
        let Some(pos) = self.archived.iter().position(|a| a.confession.id == id) else {
            return;
        };
        let confession = self.archived.remove(pos).restore();
        self.stats.total += 1;
        if !confession.is_read {
            self.stats.unread += 1;
        }
        self.active.push(confession);
    }

    /// Not idempotent: calling it again on a read item decrements `unread` again,
    /// matching what the dashboard does after each successful PATCH.
    pub fn mark_read(&mut self, id: Uuid) {
        if let Some(confession) = self.active.iter_mut().find(|c| c.id == id) {
            confession.is_read = true;
            self.stats.unread -= 1;
        }
    }

    pub fn delete(&mut self, id: Uuid, from_archived: bool) {
        if from_archived {
            self.archived.retain(|a| a.confession.id != id);
            return;
        }
        let before = self.active.len();
        self.active.retain(|c| c.id != id);
        if self.active.len() < before {
            self.stats.total -= 1;
        }
    }

    /// Drops every active confession from `ip`, as after a ban plus bulk delete.
    /// Counters are left alone; the dashboard refetches them afterwards.
    pub fn purge_ip(&mut self, ip: &str) -> usize {
        let before = self.active.len();
        self.active.retain(|c| c.ip_address != ip);
        before - self.active.len()
    }
}
