//! Mock data generator: end-to-end profile checks.

use chrono::{DateTime, NaiveDate, Utc};
use referral_core::{
    clock::AppClock,
    config::AppConfig,
    generator::{
        MockDataGenerator, MAX_ACTIVITIES, MAX_REFERRALS, MAX_STAGE_GAP_DAYS, MIN_REFERRALS,
        MIN_STAGE_GAP_DAYS,
    },
    referral::ReferralStatus,
    user::{Level, StampKind, UserRecord},
};

// ── Test helpers ───────────────────────────────────────────────────

fn fixed_now() -> DateTime<Utc> {
    AppClock::fixed_on(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).now()
}

fn generate(email: &str) -> UserRecord {
    MockDataGenerator::new(&AppConfig::default_test()).generate(email, fixed_now())
}

const SAMPLE_EMAILS: [&str; 8] = [
    "yossi.cohen@example.com",
    "dana.levi@example.com",
    "noa_mizrahi@example.com",
    "avi-peretz@example.com",
    "michal.friedman+work@example.com",
    "x@example.com",
    "sarah.katz@example.com",
    "daniel.shapiro@example.com",
];

// ── Tests ──────────────────────────────────────────────────────────

/// The reference user: a recognizable name, a referral history within
/// bounds, and a point total that matches its stamps.
#[test]
fn yossi_cohen_profile() {
    let user = generate("yossi.cohen@example.com");

    assert_eq!(user.email, "yossi.cohen@example.com");
    assert_eq!(user.latin_name, "Yossi Cohen");
    assert_eq!(user.first_name, "יוסי");
    assert_eq!(user.last_name, "כהן");

    let n = user.referrals.len() as i64;
    assert!(
        (MIN_REFERRALS..=MAX_REFERRALS).contains(&n),
        "Referral count {n} outside {MIN_REFERRALS}..={MAX_REFERRALS}"
    );

    let stamp_sum: u32 = user.stamps.iter().map(|s| s.points).sum();
    assert_eq!(user.points(), stamp_sum, "Points must equal the stamp sum");
    assert_eq!(user.level().level, Level::for_points(stamp_sum));
}

#[test]
fn referrals_are_well_formed() {
    let today = fixed_now().date_naive();
    for email in SAMPLE_EMAILS {
        let user = generate(email);
        for r in &user.referrals {
            assert!(!r.timeline.is_empty(), "{email}: {} has no timeline", r.id);
            assert_eq!(r.timeline[0].status, ReferralStatus::Submitted);
            assert_eq!(
                r.timeline.last().map(|t| t.status),
                Some(r.status),
                "{email}: timeline of {} must end at its status",
                r.id
            );
            assert_eq!(r.timeline[0].date, r.submitted_at);
            for pair in r.timeline.windows(2) {
                let gap = (pair[1].date - pair[0].date).num_days();
                assert!(
                    (MIN_STAGE_GAP_DAYS..=MAX_STAGE_GAP_DAYS).contains(&gap),
                    "{email}: {} has a {gap}-day gap between {:?} and {:?}",
                    r.id,
                    pair[0].status,
                    pair[1].status
                );
            }
            for entry in &r.timeline {
                assert!(entry.date <= today, "{email}: {} has a future date", r.id);
            }
        }
    }
}

#[test]
fn referrals_are_listed_newest_first() {
    for email in SAMPLE_EMAILS {
        let user = generate(email);
        for pair in user.referrals.windows(2) {
            assert!(
                pair[0].submitted_at >= pair[1].submitted_at,
                "{email}: referrals out of order"
            );
        }
    }
}

/// Six or more referrals cover every status at least once.
#[test]
fn large_histories_cover_every_status() {
    for email in SAMPLE_EMAILS {
        let user = generate(email);
        if user.referrals.len() < ReferralStatus::ALL.len() {
            continue;
        }
        for status in ReferralStatus::ALL {
            assert!(
                user.referrals.iter().any(|r| r.status == status),
                "{email}: {} referrals but no {status:?}",
                user.referrals.len()
            );
        }
    }
}

#[test]
fn stamps_follow_the_history() {
    for email in SAMPLE_EMAILS {
        let user = generate(email);
        let first = user
            .stamps
            .iter()
            .filter(|s| s.kind == StampKind::FirstReferral)
            .count();
        assert_eq!(first, 1, "{email}: expected exactly one first-referral stamp");

        let submitted = user
            .stamps
            .iter()
            .filter(|s| s.kind == StampKind::ReferralSubmitted)
            .count();
        assert_eq!(submitted, user.referrals.len(), "{email}: one submit stamp per referral");

        let hires = user.referrals.iter().filter(|r| r.status == ReferralStatus::Hired).count();
        let hire_stamps = user.stamps.iter().filter(|s| s.kind == StampKind::HireBonus).count();
        assert_eq!(hires, hire_stamps, "{email}: one hire stamp per hire");
    }
}

#[test]
fn activity_feed_is_capped_and_sorted() {
    for email in SAMPLE_EMAILS {
        let user = generate(email);
        assert!(user.activities.len() <= MAX_ACTIVITIES);
        for pair in user.activities.windows(2) {
            assert!(pair[0].date >= pair[1].date, "{email}: feed out of order");
        }
    }
}

/// A one-token local part still yields a complete name.
#[test]
fn single_token_email_gets_a_full_name() {
    let user = generate("x@example.com");
    assert!(!user.first_name.is_empty());
    assert!(!user.last_name.is_empty());
}

/// A large population: every stage gap stays within bounds even for
/// referrals submitted only days ago.
#[test]
fn stage_gaps_hold_across_many_users() {
    let today = fixed_now().date_naive();
    let generator = MockDataGenerator::new(&AppConfig::default_test());
    let mut checked = 0;
    for i in 0..300 {
        let user = generator.generate(&format!("user{i}.test@example.com"), fixed_now());
        for r in &user.referrals {
            for pair in r.timeline.windows(2) {
                let gap = (pair[1].date - pair[0].date).num_days();
                assert!(
                    (MIN_STAGE_GAP_DAYS..=MAX_STAGE_GAP_DAYS).contains(&gap),
                    "{}: gap of {gap} days",
                    r.id
                );
                checked += 1;
            }
            assert!(r.timeline.last().map_or(true, |t| t.date <= today));
        }
    }
    assert!(checked > 0);
}
