//! Referral records and the pipeline they move through.
//!
//! Pipeline:
//!   submitted → review → interview → offer → hired
//!                  \__________\___________\____→ rejected (terminal)
//!
//! RULE: status only moves forward along the pipeline. `rejected` is
//! reachable from any stage before `hired`. Both `hired` and `rejected`
//! are terminal.

use crate::{
    error::{DeskError, DeskResult},
    types::{CampaignId, PositionId, ReferralId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Submitted,
    Review,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl ReferralStatus {
    /// Every status, pipeline order first, `Rejected` last.
    pub const ALL: [ReferralStatus; 6] = [
        Self::Submitted,
        Self::Review,
        Self::Interview,
        Self::Offer,
        Self::Hired,
        Self::Rejected,
    ];

    /// The forward pipeline, excluding the rejected branch.
    pub const PIPELINE: [ReferralStatus; 5] = [
        Self::Submitted,
        Self::Review,
        Self::Interview,
        Self::Offer,
        Self::Hired,
    ];

    /// Position in the forward pipeline. `None` for `Rejected`.
    pub fn stage_index(&self) -> Option<usize> {
        Self::PIPELINE.iter().position(|s| s == self)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Review | Self::Interview | Self::Offer
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Base points awarded when a referral reaches this stage.
    pub fn stage_points(&self) -> u32 {
        match self {
            Self::Submitted => 50,
            Self::Interview => 100,
            Self::Hired     => 500,
            Self::Review | Self::Offer | Self::Rejected => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Review    => "In Review",
            Self::Interview => "Interview",
            Self::Offer     => "Offer",
            Self::Hired     => "Hired",
            Self::Rejected  => "Rejected",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Review    => "review",
            Self::Interview => "interview",
            Self::Offer     => "offer",
            Self::Hired     => "hired",
            Self::Rejected  => "rejected",
        }
    }

    /// Whether `self → next` respects the pipeline ordering.
    pub fn can_transition_to(&self, next: ReferralStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage_index(), next.stage_index()) {
            (_, None)          => true, // rejected from any pre-hired stage
            (Some(a), Some(b)) => b > a,
            (None, Some(_))    => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateInfo {
    pub name:  String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One recorded stage transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineEntry {
    pub status: ReferralStatus,
    pub date:   NaiveDate,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferralRecord {
    pub id:             ReferralId,
    pub candidate:      CandidateInfo,
    pub position_id:    PositionId,
    pub position_title: String,
    pub department:     String,
    pub status:         ReferralStatus,
    pub submitted_at:   NaiveDate,
    pub timeline:       Vec<TimelineEntry>,
    #[serde(default)]
    pub relationship:   Option<String>,
    #[serde(default)]
    pub notes:          Option<String>,
    /// Campaign that boosted this referral's points, if any.
    #[serde(default)]
    pub campaign_id:    Option<CampaignId>,
}

impl ReferralRecord {
    /// Points earned so far: the sum over the recorded timeline.
    pub fn points_earned(&self) -> u32 {
        self.timeline.iter().map(|t| t.points).sum()
    }

    /// Base points still on the table if the referral goes all the way.
    /// Zero once the referral is terminal.
    pub fn potential_points(&self) -> u32 {
        if self.status.is_terminal() {
            return 0;
        }
        let reached = self.status.stage_index().unwrap_or(0);
        ReferralStatus::PIPELINE[reached + 1..]
            .iter()
            .map(ReferralStatus::stage_points)
            .sum()
    }

    /// Move to `next`, appending a timeline entry worth `points`.
    pub fn advance(&mut self, next: ReferralStatus, date: NaiveDate, points: u32) -> DeskResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DeskError::InvalidTransition {
                from: self.status,
                to:   next,
            });
        }
        self.status = next;
        self.timeline.push(TimelineEntry {
            status: next,
            date,
            points,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: ReferralStatus) -> ReferralRecord {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        ReferralRecord {
            id:             "ref-1".into(),
            candidate:      CandidateInfo {
                name:  "Dana Levi".into(),
                email: "dana@example.com".into(),
                phone: None,
            },
            position_id:    "pos-1".into(),
            position_title: "Backend Engineer".into(),
            department:     "Engineering".into(),
            status,
            submitted_at:   date,
            timeline:       vec![TimelineEntry {
                status: ReferralStatus::Submitted,
                date,
                points: 50,
            }],
            relationship:   None,
            notes:          None,
            campaign_id:    None,
        }
    }

    #[test]
    fn forward_transitions_only() {
        use ReferralStatus::*;
        assert!(Submitted.can_transition_to(Interview));
        assert!(Offer.can_transition_to(Hired));
        assert!(!Interview.can_transition_to(Review));
        assert!(!Hired.can_transition_to(Rejected));
        assert!(Offer.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Submitted));
    }

    #[test]
    fn potential_points_counts_remaining_stages() {
        let r = record(ReferralStatus::Submitted);
        assert_eq!(r.potential_points(), 600);
        let r = record(ReferralStatus::Interview);
        assert_eq!(r.potential_points(), 500);
        let r = record(ReferralStatus::Rejected);
        assert_eq!(r.potential_points(), 0);
    }

    #[test]
    fn advance_rejects_backwards_moves() {
        let mut r = record(ReferralStatus::Interview);
        let date = r.submitted_at;
        assert!(r.advance(ReferralStatus::Review, date, 0).is_err());
        r.advance(ReferralStatus::Offer, date, 0).unwrap();
        assert_eq!(r.status, ReferralStatus::Offer);
        assert_eq!(r.timeline.len(), 2);
    }
}
