//! Derived stats: counts, trends, campaign points, levels, filters.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use referral_core::{
    campaign::CampaignRecord,
    clock::AppClock,
    config::AppConfig,
    generator::MockDataGenerator,
    referral::{CandidateInfo, ReferralRecord, ReferralStatus, TimelineEntry},
    stats::{
        campaign_adjusted_points, filter_referrals, trend_delta, LevelProgress, ReferralFilters,
        SortOrder, StatsSnapshot, StatusCounts, TrendDelta, TrendTracker,
    },
    storage::{LocalStorage, MemoryStorage},
    user::Level,
};

// ── Test helpers ───────────────────────────────────────────────────

fn fixed_now() -> DateTime<Utc> {
    AppClock::fixed_on(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).now()
}

fn referral(id: &str, name: &str, status: ReferralStatus, days_ago: i64) -> ReferralRecord {
    let submitted_at = fixed_now().date_naive() - Duration::days(days_ago);
    let timeline = match status.stage_index() {
        Some(idx) => ReferralStatus::PIPELINE[..=idx].to_vec(),
        None => vec![ReferralStatus::Submitted, ReferralStatus::Rejected],
    }
    .into_iter()
    .map(|s| TimelineEntry {
        status: s,
        date:   submitted_at,
        points: s.stage_points(),
    })
    .collect();

    ReferralRecord {
        id:             id.into(),
        candidate:      CandidateInfo {
            name:  name.into(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: None,
        },
        position_id:    "pos-001".into(),
        position_title: "Senior Backend Engineer".into(),
        department:     "Engineering".into(),
        status,
        submitted_at,
        timeline,
        relationship:   None,
        notes:          None,
        campaign_id:    None,
    }
}

fn sample() -> Vec<ReferralRecord> {
    vec![
        referral("r1", "Dana Levi", ReferralStatus::Submitted, 2),
        referral("r2", "Avi Peretz", ReferralStatus::Interview, 20),
        referral("r3", "Noa Katz", ReferralStatus::Hired, 90),
        referral("r4", "Eli Mor", ReferralStatus::Rejected, 40),
        referral("r5", "Tal Ben Ami", ReferralStatus::Offer, 10),
    ]
}

fn campaign(multiplier: f64) -> CampaignRecord {
    CampaignRecord {
        id:           "cmp".into(),
        title:        "Test".into(),
        multiplier,
        departments:  vec![],
        position_ids: vec![],
        starts_at:    fixed_now() - Duration::days(1),
        ends_at:      fixed_now() + Duration::days(1),
    }
}

// ── Counts ─────────────────────────────────────────────────────────

#[test]
fn status_counts_partition_the_total() {
    let counts = StatusCounts::from_referrals(&sample());
    assert_eq!(counts.total, 5);
    assert_eq!(counts.in_progress, 3);
    assert_eq!(counts.hired, 1);
    assert_eq!(counts.rejected, 1);
    assert_eq!(counts.in_progress + counts.hired + counts.rejected, counts.total);
    assert_eq!(counts.submitted_only, 1);
    assert_eq!(
        counts.submitted_only + counts.advancing() + counts.hired + counts.rejected,
        counts.total,
        "Mutually exclusive buckets must cover every referral"
    );
    assert_eq!(counts.by_status.values().sum::<usize>(), counts.total);
    assert_eq!(counts.count(ReferralStatus::Review), 0);
}

/// Generated profiles keep the partition too.
#[test]
fn generated_profiles_partition() {
    let generator = MockDataGenerator::new(&AppConfig::default_test());
    for email in ["a.b@example.com", "dana.levi@example.com", "yossi.cohen@example.com"] {
        let user = generator.generate(email, fixed_now());
        let c = StatusCounts::from_referrals(&user.referrals);
        assert_eq!(c.in_progress + c.hired + c.rejected, c.total, "{email}: partition broken");
        assert_eq!(c.submitted_only + c.advancing() + c.hired + c.rejected, c.total);
    }
}

#[test]
fn empty_history_counts_zero() {
    let counts = StatusCounts::from_referrals(&[]);
    assert_eq!(counts, StatusCounts::default());
}

// ── Trends ─────────────────────────────────────────────────────────

#[test]
fn trend_without_baseline_is_flat() {
    let current = StatsSnapshot { total: 5, in_progress: 3, hired: 1, rejected: 1, points: 900 };
    assert!(trend_delta(&current, None).is_flat());
}

/// Computing twice with unchanged data yields a flat second delta.
#[test]
fn trend_compute_is_idempotent_on_unchanged_data() {
    let mut storage = MemoryStorage::new();
    let tracker = TrendTracker::new("referral-desk:stats-snapshot");

    let before = StatsSnapshot { total: 4, in_progress: 2, hired: 1, rejected: 1, points: 700 };
    tracker.compute(&mut storage, &before);

    let after = StatsSnapshot { total: 5, in_progress: 3, hired: 1, rejected: 1, points: 750 };
    let first = tracker.compute(&mut storage, &after);
    assert_eq!(
        first,
        TrendDelta { total: 1, in_progress: 1, hired: 0, rejected: 0, points: 50 }
    );

    let second = tracker.compute(&mut storage, &after);
    assert!(second.is_flat(), "Second compute should be flat, got {second:?}");
}

#[test]
fn trend_peek_does_not_move_the_baseline() {
    let mut storage = MemoryStorage::new();
    let tracker = TrendTracker::new("trend");
    let base = StatsSnapshot { points: 100, ..Default::default() };
    tracker.compute(&mut storage, &base);

    let now = StatsSnapshot { points: 160, ..Default::default() };
    assert_eq!(tracker.peek(&storage, &now).points, 60);
    assert_eq!(tracker.peek(&storage, &now).points, 60);
}

#[test]
fn corrupt_trend_baseline_reads_as_missing() {
    let mut storage = MemoryStorage::new();
    storage.set_item("trend", "not json").unwrap();
    let tracker = TrendTracker::new("trend");
    let now = StatsSnapshot { total: 3, ..Default::default() };
    assert!(tracker.compute(&mut storage, &now).is_flat());
}

// ── Campaign points ────────────────────────────────────────────────

#[test]
fn campaign_multiplier_applies() {
    let doubled = campaign_adjusted_points(100, Some(&campaign(2.0)));
    assert_eq!(doubled.total, 200);
    assert!(doubled.has_campaign);

    let plain = campaign_adjusted_points(100, None);
    assert_eq!(plain.total, 100);
    assert_eq!(plain.multiplier, 1.0);
    assert!(!plain.has_campaign);
}

/// Fractional totals round down.
#[test]
fn fractional_totals_floor() {
    assert_eq!(campaign_adjusted_points(50, Some(&campaign(1.25))).total, 62);
    assert_eq!(campaign_adjusted_points(25, Some(&campaign(1.5))).total, 37);
}

// ── Levels ─────────────────────────────────────────────────────────

#[test]
fn level_progress_within_tier() {
    let p = LevelProgress::from_points(500);
    assert_eq!(p.level, Level::Connector);
    assert_eq!(p.next, Some(Level::Networker));
    assert_eq!(p.points_to_next, 250);
    assert_eq!(p.percent, 50);
}

#[test]
fn level_boundaries() {
    assert_eq!(LevelProgress::from_points(0).level, Level::Rookie);
    assert_eq!(LevelProgress::from_points(249).level, Level::Rookie);
    assert_eq!(LevelProgress::from_points(250).level, Level::Connector);
    assert_eq!(LevelProgress::from_points(250).percent, 0);
}

#[test]
fn top_tier_is_complete() {
    let p = LevelProgress::from_points(12_000);
    assert_eq!(p.level, Level::Legend);
    assert_eq!(p.next, None);
    assert_eq!(p.points_to_next, 0);
    assert_eq!(p.percent, 100);
}

// ── Filters ────────────────────────────────────────────────────────

#[test]
fn filter_by_status_and_search() {
    let referrals = sample();
    let hired = filter_referrals(
        &referrals,
        &ReferralFilters { status: Some(ReferralStatus::Hired), ..Default::default() },
    );
    assert_eq!(hired.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["r3"]);

    let search = filter_referrals(
        &referrals,
        &ReferralFilters { search: "  LEVI ".into(), ..Default::default() },
    );
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].id, "r1");
}

#[test]
fn sort_orders() {
    let referrals = sample();
    let ids = |sort: SortOrder| -> Vec<String> {
        filter_referrals(&referrals, &ReferralFilters { sort, ..Default::default() })
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    };
    assert_eq!(ids(SortOrder::Newest), vec!["r1", "r5", "r2", "r4", "r3"]);
    assert_eq!(ids(SortOrder::Oldest), vec!["r3", "r4", "r2", "r5", "r1"]);
    assert_eq!(ids(SortOrder::Points).first().map(String::as_str), Some("r3"));
}
