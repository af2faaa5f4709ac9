//! Mock data generator: a complete user profile from an email address.
//!
//! RULE: `generate()` is a pure function of (email, now, config tables).
//! Every random draw goes through one `SeededRng` seeded on the
//! normalized email, in a fixed order:
//!   1. display name
//!   2. department, join date
//!   3. referral count, statuses
//!   4. per referral: candidate, position, stages, stage gaps, submit date
//!   5. probabilistic stamps (campaign, streak)
//! Reordering these draws changes every generated profile.

use crate::{
    campaign::CampaignRecord,
    config::{AppConfig, CampaignConfig, Position},
    names::NameGenerator,
    referral::{CandidateInfo, ReferralRecord, ReferralStatus, TimelineEntry},
    rng::{hash_seed, SeededRng},
    user::{Activity, ActivityKind, Stamp, StampKind, UserRecord},
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

pub const MIN_REFERRALS: i64 = 3;
pub const MAX_REFERRALS: i64 = 8;
pub const MIN_STAGE_GAP_DAYS: i64 = 3;
pub const MAX_STAGE_GAP_DAYS: i64 = 14;
pub const MAX_ACTIVITIES: usize = 20;

/// Status draw weights, aligned with `ReferralStatus::ALL`.
/// Skewed toward the early pipeline.
const STATUS_WEIGHTS: [f64; 6] = [0.25, 0.20, 0.20, 0.10, 0.15, 0.10];

const CAMPAIGN_STAMP_MIN_TENURE_DAYS: i64 = 180;
const CAMPAIGN_STAMP_CHANCE: f64 = 0.3;
const STREAK_WINDOW_DAYS: i64 = 60;
const STREAK_MIN_REFERRALS: usize = 2;
const STREAK_CHANCE: f64 = 0.5;

const RELATIONSHIPS: &[&str] = &["former_colleague", "friend", "classmate", "professional_network"];

pub struct MockDataGenerator {
    departments: Vec<String>,
    positions:   Vec<Position>,
    campaigns:   Vec<CampaignConfig>,
}

impl MockDataGenerator {
    pub fn new(config: &AppConfig) -> Self {
        let open: Vec<Position> = config.positions.iter().filter(|p| p.open).cloned().collect();
        Self {
            departments: config.departments.clone(),
            positions:   if open.is_empty() { config.positions.clone() } else { open },
            campaigns:   config.campaigns.clone(),
        }
    }

    /// Build the full profile for `email` as of `now`.
    pub fn generate(&self, email: &str, now: DateTime<Utc>) -> UserRecord {
        let email = email.trim().to_lowercase();
        let mut rng = SeededRng::from_seed_str(&email);
        let today = now.date_naive();

        let name = NameGenerator::localize(&email, &mut rng);
        let user_id = format!("usr-{:08x}", hash_seed(&email) as u32);

        let department = rng
            .pick(&self.departments)
            .cloned()
            .unwrap_or_else(|| "General".to_string());
        let joined_at = today - Duration::days(365 + rng.next_below(730) as i64);

        let count = rng.range_inclusive(MIN_REFERRALS, MAX_REFERRALS) as usize;
        let statuses = draw_statuses(count, &mut rng);

        let mut referrals: Vec<ReferralRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| self.build_referral(&user_id, i, *status, joined_at, today, &mut rng))
            .collect();
        // Newest first, as the referrals list shows them.
        referrals.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let stamps = derive_stamps(&user_id, &referrals, joined_at, today, &mut rng);
        let activities = derive_activities(&referrals, &stamps);
        let campaigns: Vec<CampaignRecord> = self.campaigns.iter().map(|c| c.resolve(now)).collect();

        log::debug!(
            "generated {user_id}: {} referrals, {} stamps",
            referrals.len(),
            stamps.len()
        );

        UserRecord {
            id: user_id,
            email,
            first_name: name.first,
            last_name: name.last,
            latin_name: name.latin,
            department,
            joined_at,
            referrals,
            stamps,
            activities,
            campaigns,
        }
    }

    fn build_referral(
        &self,
        user_id: &str,
        index: usize,
        status: ReferralStatus,
        joined_at: NaiveDate,
        today: NaiveDate,
        rng: &mut SeededRng,
    ) -> ReferralRecord {
        let (candidate_name, candidate_email) = NameGenerator::random_candidate(rng);
        let position = rng.pick(&self.positions).cloned();
        let relationship = rng.pick(RELATIONSHIPS).map(|r| r.to_string());

        let stages = stages_for(status, rng);
        let gaps: Vec<i64> = (1..stages.len())
            .map(|_| rng.range_inclusive(MIN_STAGE_GAP_DAYS, MAX_STAGE_GAP_DAYS))
            .collect();
        let span: i64 = gaps.iter().sum();

        // The whole timeline must fit between the submission and today.
        let tenure_days = (today - joined_at).num_days().max(1);
        let earliest = span.max(1);
        let submitted_days_ago = rng.range_inclusive(earliest, tenure_days.min(365).max(earliest));
        let submitted_at = today - Duration::days(submitted_days_ago);

        let mut timeline = Vec::with_capacity(stages.len());
        let mut date = submitted_at;
        for (i, stage) in stages.iter().enumerate() {
            if i > 0 {
                date += Duration::days(gaps[i - 1]);
            }
            timeline.push(TimelineEntry {
                status: *stage,
                date,
                points: stage.stage_points(),
            });
        }

        let (position_id, position_title, department) = match position {
            Some(p) => (p.id, p.title, p.department),
            None    => ("pos-unknown".into(), "Open Position".into(), "General".into()),
        };

        ReferralRecord {
            id: format!("{user_id}-r{:02}", index + 1),
            candidate: CandidateInfo {
                name:  candidate_name,
                email: candidate_email,
                phone: None,
            },
            position_id,
            position_title,
            department,
            status,
            submitted_at,
            timeline,
            relationship,
            notes: None,
            campaign_id: None,
        }
    }
}

/// Weighted draws, then coverage: a user with at least as many referrals
/// as there are statuses gets every status at least once.
fn draw_statuses(count: usize, rng: &mut SeededRng) -> Vec<ReferralStatus> {
    let mut statuses: Vec<ReferralStatus> = (0..count)
        .map(|_| ReferralStatus::ALL[rng.weighted_index(&STATUS_WEIGHTS)])
        .collect();

    if count < ReferralStatus::ALL.len() {
        return statuses;
    }

    for missing in ReferralStatus::ALL {
        if statuses.contains(&missing) {
            continue;
        }
        let mut counts: BTreeMap<ReferralStatus, usize> = BTreeMap::new();
        for s in &statuses {
            *counts.entry(*s).or_default() += 1;
        }
        if let Some(slot) = statuses
            .iter()
            .rposition(|s| counts.get(s).copied().unwrap_or(0) > 1)
        {
            statuses[slot] = missing;
        }
    }
    statuses
}

/// Stages a referral passed through to reach `status`.
/// Rejected referrals stop at a random pre-hired stage first.
fn stages_for(status: ReferralStatus, rng: &mut SeededRng) -> Vec<ReferralStatus> {
    match status.stage_index() {
        Some(idx) => ReferralStatus::PIPELINE[..=idx].to_vec(),
        None => {
            let reached = rng.next_below(ReferralStatus::PIPELINE.len() - 1);
            let mut stages = ReferralStatus::PIPELINE[..=reached].to_vec();
            stages.push(ReferralStatus::Rejected);
            stages
        }
    }
}

fn derive_stamps(
    user_id: &str,
    referrals: &[ReferralRecord],
    joined_at: NaiveDate,
    today: NaiveDate,
    rng: &mut SeededRng,
) -> Vec<Stamp> {
    let mut stamps: Vec<Stamp> = Vec::new();
    let mut push = |kind: StampKind, earned_at: NaiveDate, referral_id: Option<&str>| {
        let id = format!("{user_id}-s{:03}", stamps.len() + 1);
        stamps.push(Stamp {
            id,
            kind,
            points: kind.points(),
            earned_at,
            referral_id: referral_id.map(str::to_string),
        });
    };

    if let Some(first) = referrals.iter().min_by_key(|r| r.submitted_at) {
        push(StampKind::FirstReferral, first.submitted_at, Some(first.id.as_str()));
    }

    for referral in referrals {
        for entry in &referral.timeline {
            let kind = match entry.status {
                ReferralStatus::Submitted => StampKind::ReferralSubmitted,
                ReferralStatus::Interview => StampKind::InterviewReached,
                ReferralStatus::Hired     => StampKind::HireBonus,
                _ => continue,
            };
            push(kind, entry.date, Some(referral.id.as_str()));

            if entry.status == ReferralStatus::Hired {
                let three = entry.date + Duration::days(90);
                let six = entry.date + Duration::days(180);
                if three <= today {
                    push(StampKind::ThreeMonthMilestone, three, Some(referral.id.as_str()));
                }
                if six <= today {
                    push(StampKind::SixMonthMilestone, six, Some(referral.id.as_str()));
                }
            }
        }
    }

    let tenure_days = (today - joined_at).num_days();
    if tenure_days >= CAMPAIGN_STAMP_MIN_TENURE_DAYS && rng.chance(CAMPAIGN_STAMP_CHANCE) {
        let earned_at = today - Duration::days(rng.next_below(30) as i64);
        push(StampKind::CampaignBonus, earned_at.max(joined_at), None);
    }

    let window_start = today - Duration::days(STREAK_WINDOW_DAYS);
    let recent: Vec<&ReferralRecord> = referrals
        .iter()
        .filter(|r| r.submitted_at >= window_start)
        .collect();
    if recent.len() >= STREAK_MIN_REFERRALS && rng.chance(STREAK_CHANCE) {
        if let Some(latest) = recent.iter().map(|r| r.submitted_at).max() {
            push(StampKind::Streak, latest, None);
        }
    }

    stamps
}

fn derive_activities(referrals: &[ReferralRecord], stamps: &[Stamp]) -> Vec<Activity> {
    let mut activities: Vec<Activity> = referrals
        .iter()
        .flat_map(|r| {
            r.timeline.iter().map(move |t| Activity {
                date:        t.date,
                kind:        ActivityKind::StatusChange,
                description: format!(
                    "{} · {}: {}",
                    r.candidate.name,
                    r.position_title,
                    t.status.label()
                ),
                points:      t.points,
            })
        })
        .chain(stamps.iter().map(|s| Activity {
            date:        s.earned_at,
            kind:        ActivityKind::StampEarned,
            description: format!("Stamp earned: {}", s.kind.title()),
            points:      s.points,
        }))
        .collect();

    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities.truncate(MAX_ACTIVITIES);
    activities
}
