//! User profile, stamps, activity feed and levels.
//!
//! RULE: a user's point total is never stored. `UserRecord::points()`
//! sums the stamps every time, so the total cannot drift from the
//! stamps that justify it.

use crate::{
    campaign::CampaignRecord,
    referral::ReferralRecord,
    types::{ReferralId, UserId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Stamps ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StampKind {
    FirstReferral,
    ReferralSubmitted,
    InterviewReached,
    HireBonus,
    ThreeMonthMilestone,
    SixMonthMilestone,
    CampaignBonus,
    Streak,
}

impl StampKind {
    pub fn points(&self) -> u32 {
        match self {
            Self::FirstReferral       => 25,
            Self::ReferralSubmitted   => 50,
            Self::InterviewReached    => 100,
            Self::HireBonus           => 500,
            Self::ThreeMonthMilestone => 200,
            Self::SixMonthMilestone   => 300,
            Self::CampaignBonus       => 150,
            Self::Streak              => 75,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FirstReferral       => "First Referral",
            Self::ReferralSubmitted   => "Referral Submitted",
            Self::InterviewReached    => "Interview Reached",
            Self::HireBonus           => "Successful Hire",
            Self::ThreeMonthMilestone => "3-Month Milestone",
            Self::SixMonthMilestone   => "6-Month Milestone",
            Self::CampaignBonus       => "Campaign Bonus",
            Self::Streak              => "Referral Streak",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stamp {
    pub id:          String,
    pub kind:        StampKind,
    pub points:      u32,
    pub earned_at:   NaiveDate,
    #[serde(default)]
    pub referral_id: Option<ReferralId>,
}

// ── Activity feed ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StatusChange,
    StampEarned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub date:        NaiveDate,
    pub kind:        ActivityKind,
    pub description: String,
    pub points:      u32,
}

// ── Levels ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Rookie,
    Connector,
    Networker,
    Ambassador,
    Legend,
}

impl Level {
    /// Ascending tiers with their minimum point totals.
    pub const THRESHOLDS: [(Level, u32); 5] = [
        (Level::Rookie, 0),
        (Level::Connector, 250),
        (Level::Networker, 750),
        (Level::Ambassador, 2000),
        (Level::Legend, 5000),
    ];

    pub fn for_points(points: u32) -> Level {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(_, min)| points >= *min)
            .map(|(level, _)| *level)
            .unwrap_or(Level::Rookie)
    }

    pub fn min_points(&self) -> u32 {
        Self::THRESHOLDS
            .iter()
            .find(|(level, _)| level == self)
            .map(|(_, min)| *min)
            .unwrap_or(0)
    }

    pub fn next(&self) -> Option<Level> {
        match self {
            Self::Rookie     => Some(Self::Connector),
            Self::Connector  => Some(Self::Networker),
            Self::Networker  => Some(Self::Ambassador),
            Self::Ambassador => Some(Self::Legend),
            Self::Legend     => None,
        }
    }
}

/// Where a point total sits within its tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelProgress {
    pub level:          Level,
    pub next:           Option<Level>,
    /// Points still needed for `next`; 0 at the top tier.
    pub points_to_next: u32,
    /// Whole percent toward `next`, 100 at the top tier.
    pub percent:        u8,
}

impl LevelProgress {
    pub fn from_points(points: u32) -> Self {
        let level = Level::for_points(points);
        let Some(next) = level.next() else {
            return Self {
                level,
                next: None,
                points_to_next: 0,
                percent: 100,
            };
        };
        let floor = level.min_points();
        let ceiling = next.min_points();
        let span = (ceiling - floor) as u64;
        let into = (points - floor) as u64;
        Self {
            level,
            next: Some(next),
            points_to_next: ceiling - points,
            percent: ((into * 100) / span).min(100) as u8,
        }
    }
}

// ── User ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id:           UserId,
    pub email:        String,
    /// Localized given name.
    pub first_name:   String,
    /// Localized family name.
    pub last_name:    String,
    /// Latin-script name as parsed from the email.
    pub latin_name:   String,
    pub department:   String,
    pub joined_at:    NaiveDate,
    pub referrals:    Vec<ReferralRecord>,
    pub stamps:       Vec<Stamp>,
    pub activities:   Vec<Activity>,
    pub campaigns:    Vec<CampaignRecord>,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Sum of all stamp points.
    pub fn points(&self) -> u32 {
        self.stamps.iter().map(|s| s.points).sum()
    }

    pub fn level(&self) -> LevelProgress {
        LevelProgress::from_points(self.points())
    }
}
