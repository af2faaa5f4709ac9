//! Referral submission: validation plus a simulated network round trip.
//!
//! Lifecycle of a submit:
//!   validate → simulated latency (cancellable) → build `submitted` record
//!
//! RULE: a cancelled submit produces no record. Callers apply the
//! returned record to the store only on `Ok`, so a submit whose view was
//! unmounted mid-flight leaves state untouched.

use crate::{
    campaign::{best_campaign_for, CampaignRecord},
    config::{LatencyConfig, Position},
    error::{DeskError, DeskResult, FieldError},
    referral::{CandidateInfo, ReferralRecord, ReferralStatus, TimelineEntry},
    rng::SessionRng,
    stats::{campaign_adjusted_points, AdjustedPoints},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NOTES_LEN: usize = 500;
pub const MIN_PHONE_DIGITS: usize = 9;
pub const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralForm {
    pub candidate_name:  String,
    pub candidate_email: String,
    #[serde(default)]
    pub candidate_phone: Option<String>,
    pub position_id:     String,
    pub relationship:    String,
    #[serde(default)]
    pub notes:           Option<String>,
}

/// Per-field checks. Every failing field is reported, not just the first.
pub fn validate(form: &ReferralForm, positions: &[Position]) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if form.candidate_name.trim().chars().count() < MIN_NAME_LEN {
        errors.push(FieldError::new(
            "candidate_name",
            format!("Name must be at least {MIN_NAME_LEN} characters"),
        ));
    }

    if !is_valid_email(form.candidate_email.trim()) {
        errors.push(FieldError::new("candidate_email", "Enter a valid email address"));
    }

    if let Some(phone) = form.candidate_phone.as_deref().filter(|p| !p.trim().is_empty()) {
        let digits: String = phone
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+'))
            .collect();
        let len = digits.chars().count();
        if !digits.chars().all(|c| c.is_ascii_digit())
            || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&len)
        {
            errors.push(FieldError::new(
                "candidate_phone",
                format!("Phone must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits"),
            ));
        }
    }

    match positions.iter().find(|p| p.id == form.position_id) {
        None => errors.push(FieldError::new("position_id", "Choose a position")),
        Some(p) if !p.open => {
            errors.push(FieldError::new("position_id", "This position is no longer open"))
        }
        Some(_) => {}
    }

    if form.relationship.trim().is_empty() {
        errors.push(FieldError::new("relationship", "Tell us how you know the candidate"));
    }

    if let Some(notes) = &form.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.push(FieldError::new(
                "notes",
                format!("Notes are limited to {MAX_NOTES_LEN} characters"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// A completed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub referral: ReferralRecord,
    /// Points for the `submitted` stage after any campaign multiplier.
    pub points:   AdjustedPoints,
}

pub struct SubmissionService {
    positions: Vec<Position>,
    latency:   LatencyConfig,
    rng:       SessionRng,
}

impl SubmissionService {
    pub fn new(positions: Vec<Position>, latency: LatencyConfig, session_seed: u64) -> Self {
        Self {
            positions,
            latency,
            rng: SessionRng::new(session_seed),
        }
    }

    fn next_delay(&mut self) -> Duration {
        let ms = self
            .rng
            .next_u64_between(self.latency.min_ms, self.latency.max_ms);
        Duration::from_millis(ms)
    }

    /// Validate, wait out the simulated round trip, build the record.
    /// Returns `DeskError::Cancelled` if `cancel` fires first.
    pub async fn submit(
        &mut self,
        form: ReferralForm,
        campaigns: &[CampaignRecord],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> DeskResult<SubmissionReceipt> {
        validate(&form, &self.positions).map_err(|errors| DeskError::Validation { errors })?;
        let position = self
            .positions
            .iter()
            .find(|p| p.id == form.position_id)
            .cloned()
            .ok_or_else(|| DeskError::UnknownPosition {
                position_id: form.position_id.clone(),
            })?;

        let delay = self.next_delay();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("submission for {} cancelled after unmount", position.id);
                return Err(DeskError::Cancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let campaign = best_campaign_for(&position, campaigns, now);
        let points = campaign_adjusted_points(ReferralStatus::Submitted.stage_points(), campaign);
        let today = now.date_naive();

        let referral = ReferralRecord {
            id:             format!("ref-{}", Uuid::new_v4().simple()),
            candidate:      CandidateInfo {
                name:  form.candidate_name.trim().to_string(),
                email: form.candidate_email.trim().to_lowercase(),
                phone: form.candidate_phone.filter(|p| !p.trim().is_empty()),
            },
            position_id:    position.id,
            position_title: position.title,
            department:     position.department,
            status:         ReferralStatus::Submitted,
            submitted_at:   today,
            timeline:       vec![TimelineEntry {
                status: ReferralStatus::Submitted,
                date:   today,
                points: points.total,
            }],
            relationship:   Some(form.relationship.trim().to_string()),
            notes:          form.notes.filter(|n| !n.trim().is_empty()),
            campaign_id:    campaign.map(|c| c.id.clone()),
        };

        log::info!(
            "referral {} submitted for {} ({} pts, x{})",
            referral.id,
            referral.position_id,
            points.total,
            points.multiplier
        );
        Ok(SubmissionReceipt { referral, points })
    }
}
