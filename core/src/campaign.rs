//! Campaigns: time-windowed point multipliers on eligible positions.
//!
//! A campaign applies to a position iff:
//!   - its department list is empty (all departments), or
//!   - the position's department is listed, or
//!   - the position id is listed explicitly.
//! and the campaign window contains "now".

use crate::{
    clock::AppClock,
    config::Position,
    types::{CampaignId, PositionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignRecord {
    pub id:           CampaignId,
    pub title:        String,
    pub multiplier:   f64,
    pub departments:  Vec<String>,
    pub position_ids: Vec<PositionId>,
    pub starts_at:    DateTime<Utc>,
    pub ends_at:      DateTime<Utc>,
}

/// Time left in a campaign, for countdown displays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    pub days:    i64,
    pub hours:   i64,
    pub minutes: i64,
}

impl CampaignRecord {
    /// Active when `starts_at <= now < ends_at`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now < self.ends_at
    }

    pub fn is_eligible(&self, position: &Position) -> bool {
        self.departments.is_empty()
            || self.departments.iter().any(|d| *d == position.department)
            || self.position_ids.iter().any(|id| *id == position.id)
    }

    /// `None` once the campaign has ended.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Countdown> {
        let left = self.ends_at - now;
        if left.num_seconds() <= 0 {
            return None;
        }
        Some(Countdown {
            days:    left.num_days(),
            hours:   left.num_hours() % 24,
            minutes: left.num_minutes() % 60,
        })
    }
}

/// Which campaigns the campaigns page lists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignFilter {
    #[default]
    All,
    Active,
    Upcoming,
    Ended,
}

impl CampaignFilter {
    pub fn matches(&self, campaign: &CampaignRecord, now: DateTime<Utc>) -> bool {
        match self {
            Self::All      => true,
            Self::Active   => campaign.is_active(now),
            Self::Upcoming => now < campaign.starts_at,
            Self::Ended    => campaign.ends_at <= now,
        }
    }
}

/// Active campaigns at `now`, in table order.
pub fn active_campaigns(campaigns: &[CampaignRecord], now: DateTime<Utc>) -> Vec<&CampaignRecord> {
    campaigns.iter().filter(|c| c.is_active(now)).collect()
}

/// The highest-multiplier active campaign that covers `position`.
/// Ties keep the first campaign in table order.
pub fn best_campaign_for<'a>(
    position: &Position,
    campaigns: &'a [CampaignRecord],
    now: DateTime<Utc>,
) -> Option<&'a CampaignRecord> {
    let mut best: Option<&'a CampaignRecord> = None;
    for c in campaigns
        .iter()
        .filter(|c| c.is_active(now) && c.is_eligible(position))
    {
        if best.map_or(true, |b| c.multiplier > b.multiplier) {
            best = Some(c);
        }
    }
    best
}

/// Drive a countdown display: call `on_tick` with the time left every
/// `period` until the campaign ends or `cancel` fires (the owning view
/// unmounted). Returns the number of ticks delivered.
pub async fn run_countdown<F>(
    campaign: &CampaignRecord,
    clock: AppClock,
    period: Duration,
    cancel: &CancellationToken,
    mut on_tick: F,
) -> usize
where
    F: FnMut(Countdown),
{
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    let mut ticks = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("countdown for {} stopped after {ticks} tick(s)", campaign.id);
                break;
            }
            _ = interval.tick() => {
                let Some(left) = campaign.time_remaining(clock.now()) else {
                    break;
                };
                on_tick(left);
                ticks += 1;
            }
        }
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn campaign(id: &str, multiplier: f64, departments: &[&str], positions: &[&str]) -> CampaignRecord {
        CampaignRecord {
            id:           id.into(),
            title:        id.into(),
            multiplier,
            departments:  departments.iter().map(|s| s.to_string()).collect(),
            position_ids: positions.iter().map(|s| s.to_string()).collect(),
            starts_at:    now() - Duration::days(1),
            ends_at:      now() + Duration::days(2) + Duration::hours(3),
        }
    }

    fn position(id: &str, department: &str) -> Position {
        Position {
            id:         id.into(),
            title:      "Role".into(),
            department: department.into(),
            location:   "Remote".into(),
            open:       true,
        }
    }

    #[test]
    fn empty_department_list_means_everyone() {
        let c = campaign("all", 1.5, &[], &[]);
        assert!(c.is_eligible(&position("p1", "Sales")));
    }

    #[test]
    fn department_or_explicit_position_match() {
        let c = campaign("eng", 2.0, &["Engineering"], &["p9"]);
        assert!(c.is_eligible(&position("p1", "Engineering")));
        assert!(c.is_eligible(&position("p9", "Sales")));
        assert!(!c.is_eligible(&position("p2", "Sales")));
    }

    #[test]
    fn best_campaign_prefers_highest_multiplier() {
        let campaigns = vec![
            campaign("all", 1.25, &[], &[]),
            campaign("eng", 2.0, &["Engineering"], &[]),
        ];
        let best = best_campaign_for(&position("p1", "Engineering"), &campaigns, now());
        assert_eq!(best.map(|c| c.id.as_str()), Some("eng"));
        let best = best_campaign_for(&position("p2", "Sales"), &campaigns, now());
        assert_eq!(best.map(|c| c.id.as_str()), Some("all"));
    }

    #[test]
    fn active_campaigns_skip_ended_and_upcoming() {
        let mut ended = campaign("ended", 2.0, &[], &[]);
        ended.ends_at = now() - Duration::hours(1);
        let mut upcoming = campaign("upcoming", 2.0, &[], &[]);
        upcoming.starts_at = now() + Duration::days(3);
        let campaigns = vec![ended, campaign("live", 1.5, &[], &[]), upcoming];

        let ids: Vec<&str> = active_campaigns(&campaigns, now())
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["live"]);
    }

    #[test]
    fn countdown_breaks_down_remaining_time() {
        let c = campaign("c", 1.0, &[], &[]);
        let left = c.time_remaining(now()).unwrap();
        assert_eq!(left, Countdown { days: 2, hours: 3, minutes: 0 });
        assert!(c.time_remaining(now() + Duration::days(5)).is_none());
        assert!(!c.is_active(now() + Duration::days(5)));
    }

    #[test]
    fn filter_partitions_by_window() {
        let c = campaign("c", 1.0, &[], &[]);
        assert!(CampaignFilter::Active.matches(&c, now()));
        assert!(CampaignFilter::Upcoming.matches(&c, now() - Duration::days(3)));
        assert!(CampaignFilter::Ended.matches(&c, now() + Duration::days(3)));
        assert!(CampaignFilter::All.matches(&c, now() + Duration::days(3)));
    }
}
