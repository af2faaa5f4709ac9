//! Derived stats: pure functions over referral records.
//!
//! Views call these on render. Nothing here mutates state except
//! `TrendTracker::compute`, which overwrites its stored baseline.

use crate::{
    campaign::CampaignRecord,
    referral::{ReferralRecord, ReferralStatus},
    storage::LocalStorage,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::user::LevelProgress;

// ── Status counts ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total:          usize,
    /// submitted + review + interview + offer
    pub in_progress:    usize,
    /// Still at `submitted`; a subset of `in_progress`.
    pub submitted_only: usize,
    pub hired:          usize,
    pub rejected:       usize,
    /// Per-status breakdown; sums to `total`.
    pub by_status:      BTreeMap<ReferralStatus, usize>,
}

impl StatusCounts {
    pub fn from_referrals(referrals: &[ReferralRecord]) -> Self {
        let mut counts = StatusCounts {
            total: referrals.len(),
            ..Default::default()
        };
        for r in referrals {
            *counts.by_status.entry(r.status).or_default() += 1;
            if r.status == ReferralStatus::Submitted {
                counts.submitted_only += 1;
            }
            match r.status {
                s if s.is_in_progress()  => counts.in_progress += 1,
                ReferralStatus::Hired    => counts.hired += 1,
                ReferralStatus::Rejected => counts.rejected += 1,
                _ => {}
            }
        }
        counts
    }

    pub fn count(&self, status: ReferralStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// In progress and past the initial submission (review, interview, offer).
    /// With `submitted_only`, `hired` and `rejected` this partitions `total`.
    pub fn advancing(&self) -> usize {
        self.in_progress - self.submitted_only
    }
}

// ── Trends ─────────────────────────────────────────────────────────

/// The figures a trend is measured on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total:       i64,
    pub in_progress: i64,
    pub hired:       i64,
    pub rejected:    i64,
    pub points:      i64,
}

impl StatsSnapshot {
    pub fn new(counts: &StatusCounts, points: u32) -> Self {
        Self {
            total:       counts.total as i64,
            in_progress: counts.in_progress as i64,
            hired:       counts.hired as i64,
            rejected:    counts.rejected as i64,
            points:      points as i64,
        }
    }
}

/// Signed change per category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendDelta {
    pub total:       i64,
    pub in_progress: i64,
    pub hired:       i64,
    pub rejected:    i64,
    pub points:      i64,
}

impl TrendDelta {
    pub fn is_flat(&self) -> bool {
        *self == TrendDelta::default()
    }
}

/// Delta of `current` against `previous`. No baseline means no change.
pub fn trend_delta(current: &StatsSnapshot, previous: Option<&StatsSnapshot>) -> TrendDelta {
    let Some(prev) = previous else {
        return TrendDelta::default();
    };
    TrendDelta {
        total:       current.total - prev.total,
        in_progress: current.in_progress - prev.in_progress,
        hired:       current.hired - prev.hired,
        rejected:    current.rejected - prev.rejected,
        points:      current.points - prev.points,
    }
}

/// Trend "since last computed", with the baseline kept in local storage.
pub struct TrendTracker {
    key: String,
}

impl TrendTracker {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// A tracker whose baseline is kept apart from every other scope's,
    /// under `{key}:{scope}`.
    pub fn scoped(&self, scope: &str) -> Self {
        Self {
            key: format!("{}:{scope}", self.key),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Delta against the stored baseline, then replace the baseline with
    /// `current`. A second call with unchanged data yields a flat delta.
    pub fn compute(&self, storage: &mut dyn LocalStorage, current: &StatsSnapshot) -> TrendDelta {
        let previous = self.read_baseline(storage);
        let delta = trend_delta(current, previous.as_ref());

        match serde_json::to_string(current) {
            Ok(json) => {
                if let Err(e) = storage.set_item(&self.key, &json) {
                    log::warn!("trend baseline not saved under '{}': {e}", self.key);
                }
            }
            Err(e) => log::warn!("trend baseline not serialized: {e}"),
        }
        delta
    }

    /// Delta against the stored baseline without moving it.
    pub fn peek(&self, storage: &dyn LocalStorage, current: &StatsSnapshot) -> TrendDelta {
        trend_delta(current, self.read_baseline(storage).as_ref())
    }

    fn read_baseline(&self, storage: &dyn LocalStorage) -> Option<StatsSnapshot> {
        match storage.get_item(&self.key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    log::warn!("discarding corrupt trend baseline '{}': {e}", self.key);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("trend baseline unreadable under '{}': {e}", self.key);
                None
            }
        }
    }
}

// ── Campaign-adjusted points ───────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AdjustedPoints {
    pub base:         u32,
    pub multiplier:   f64,
    pub total:        u32,
    pub has_campaign: bool,
}

/// `total = floor(base * multiplier)`; no campaign means multiplier 1.
pub fn campaign_adjusted_points(base: u32, campaign: Option<&CampaignRecord>) -> AdjustedPoints {
    let multiplier = campaign.map(|c| c.multiplier.max(0.0)).unwrap_or(1.0);
    AdjustedPoints {
        base,
        multiplier,
        total: (base as f64 * multiplier).floor() as u32,
        has_campaign: campaign.is_some(),
    }
}

// ── Filtering and sorting ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Status,
    Points,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralFilters {
    /// `None` shows every status.
    #[serde(default)]
    pub status: Option<ReferralStatus>,
    /// Case-insensitive match on candidate name, email or position title.
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort:   SortOrder,
}

pub fn filter_referrals<'a>(
    referrals: &'a [ReferralRecord],
    filters: &ReferralFilters,
) -> Vec<&'a ReferralRecord> {
    let needle = filters.search.trim().to_lowercase();
    let mut out: Vec<&ReferralRecord> = referrals
        .iter()
        .filter(|r| filters.status.map_or(true, |s| r.status == s))
        .filter(|r| {
            needle.is_empty()
                || r.candidate.name.to_lowercase().contains(&needle)
                || r.candidate.email.to_lowercase().contains(&needle)
                || r.position_title.to_lowercase().contains(&needle)
        })
        .collect();

    match filters.sort {
        SortOrder::Newest => out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at)),
        SortOrder::Oldest => out.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at)),
        SortOrder::Status => out.sort_by_key(|r| r.status),
        SortOrder::Points => out.sort_by(|a, b| b.points_earned().cmp(&a.points_earned())),
    }
    out
}
