//! The desk application context: store, router and services for one
//! session, wired together without any process-wide singleton.
//!
//! Flow of a navigation:
//!   1. `Router::navigate` applies the auth guards and writes `currentView`.
//!   2. The page-host subscriber on `currentView` unmounts the previous
//!      view (cancelling its token) and mounts the new one.
//!   3. `DeskApp` runs per-view mount hooks (the dashboard refreshes its
//!      trend baseline once per mount).
//!
//! RULE: every error is non-fatal. `report_error` logs it and raises the
//! generic toast; the session carries on.

use crate::{
    campaign::{
        active_campaigns, best_campaign_for, run_countdown, CampaignFilter, CampaignRecord,
        Countdown,
    },
    clock::AppClock,
    command::AppCommand,
    config::{AppConfig, Position},
    error::{DeskError, DeskResult, FieldError},
    generator::{MockDataGenerator, MAX_ACTIVITIES},
    referral::{ReferralRecord, ReferralStatus},
    router::{Navigation, RouteTable, Router, DASHBOARD_ROUTE, LOGIN_ROUTE},
    state::{keys, StatePatch, StateStore},
    stats::{
        campaign_adjusted_points, filter_referrals, AdjustedPoints, LevelProgress,
        ReferralFilters, StatsSnapshot, StatusCounts, TrendDelta, TrendTracker,
    },
    storage::LocalStorage,
    submission::{ReferralForm, SubmissionReceipt, SubmissionService},
    types::ViewName,
    user::{Activity, ActivityKind, Stamp, StampKind, UserRecord},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{cell::RefCell, rc::Rc, time::Duration};
use tokio_util::sync::CancellationToken;

pub const DETAIL_ROUTE: &str = "referral-detail";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

// ── Page host ──────────────────────────────────────────────────────

/// A view swap observed on `currentView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSwap {
    pub from: Option<ViewName>,
    pub to:   ViewName,
}

struct MountedView {
    view:  ViewName,
    token: CancellationToken,
}

/// Tracks the mounted page and ties in-flight work to its lifetime.
#[derive(Default)]
pub struct PageHost {
    mounted:        Option<MountedView>,
    swaps:          Vec<ViewSwap>,
    pending_mounts: Vec<ViewName>,
}

impl PageHost {
    /// Swap to `view`. Re-mounting the current view is a no-op.
    fn mount(&mut self, view: &str) {
        if self.mounted.as_ref().is_some_and(|m| m.view == view) {
            return;
        }
        let from = self.mounted.take().map(|old| {
            old.token.cancel();
            old.view
        });
        log::debug!("mount {view} (unmount {from:?})");
        self.swaps.push(ViewSwap {
            from,
            to: view.to_string(),
        });
        self.pending_mounts.push(view.to_string());
        self.mounted = Some(MountedView {
            view:  view.to_string(),
            token: CancellationToken::new(),
        });
    }

    pub fn mounted_view(&self) -> Option<&str> {
        self.mounted.as_ref().map(|m| m.view.as_str())
    }

    /// Token cancelled when the current view unmounts.
    pub fn token(&self) -> CancellationToken {
        match &self.mounted {
            Some(m) => m.token.clone(),
            None => {
                // Nothing mounted: work started now has no owner to outlive.
                let token = CancellationToken::new();
                token.cancel();
                token
            }
        }
    }

    pub fn swaps(&self) -> &[ViewSwap] {
        &self.swaps
    }
}

// ── Read models ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignStatus {
    pub id:             String,
    pub title:          String,
    pub multiplier:     f64,
    pub active:         bool,
    pub time_remaining: Option<Countdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub display_name:     String,
    pub points:           u32,
    pub level:            LevelProgress,
    pub counts:           StatusCounts,
    pub trend:            TrendDelta,
    pub active_campaigns: Vec<CampaignStatus>,
    pub recent_activity:  Vec<Activity>,
}

/// A position with its campaign-adjusted hire reward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionReward {
    pub position:    Position,
    pub hire_reward: AdjustedPoints,
    pub campaign_id: Option<String>,
}

// ── App ────────────────────────────────────────────────────────────

pub struct DeskApp {
    config:      AppConfig,
    clock:       AppClock,
    store:       StateStore,
    router:      Router,
    generator:   MockDataGenerator,
    submissions: SubmissionService,
    trend:       TrendTracker,
    pages:       Rc<RefCell<PageHost>>,
}

impl DeskApp {
    pub fn new(
        config: AppConfig,
        storage: Box<dyn LocalStorage>,
        clock: AppClock,
        session_seed: u64,
    ) -> Self {
        let mut store = StateStore::new(storage, &config);
        let pages = Rc::new(RefCell::new(PageHost::default()));

        let host = Rc::clone(&pages);
        store.subscribe(keys::CURRENT_VIEW, move |value, _| {
            if let Some(view) = value.as_str() {
                host.borrow_mut().mount(view);
            }
        });

        Self {
            router: Router::new(RouteTable::from_config(&config.routes)),
            generator: MockDataGenerator::new(&config),
            submissions: SubmissionService::new(config.positions.clone(), config.latency, session_seed),
            trend: TrendTracker::new(config.storage.trend_key.clone()),
            config,
            clock,
            store,
            pages,
        }
    }

    /// First navigation of the session, from the initial URL fragment.
    pub fn start(&mut self, fragment: Option<&str>) -> Navigation {
        if self.store.is_authenticated() {
            match self.store.get_as::<UserRecord>(keys::CURRENT_USER) {
                Some(user) => {
                    log::info!("resuming session for {}", user.email);
                    self.store.set_state(
                        StatePatch::new().set_serialized(keys::REFERRALS, &user.referrals),
                    );
                }
                None => {
                    log::warn!("persisted session has no user; signing out");
                    self.store.reset();
                }
            }
        }
        let nav = self.router.initial(&mut self.store, fragment);
        self.after_navigation();
        nav
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mounted_view(&self) -> Option<String> {
        self.pages.borrow().mounted_view().map(str::to_string)
    }

    pub fn view_swaps(&self) -> Vec<ViewSwap> {
        self.pages.borrow().swaps().to_vec()
    }

    /// Cancellation token of the mounted view.
    pub fn view_token(&self) -> CancellationToken {
        self.pages.borrow().token()
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.store.get_as(keys::CURRENT_USER)
    }

    pub fn referrals(&self) -> Vec<ReferralRecord> {
        self.store.get_as(keys::REFERRALS).unwrap_or_default()
    }

    // ── Session ────────────────────────────────────────────────────

    /// Stub authentication: any non-empty email and password are accepted.
    pub fn login(&mut self, email: &str, password: &str) -> DeskResult<Navigation> {
        let mut errors = Vec::new();
        if email.trim().is_empty() || !email.contains('@') {
            errors.push(FieldError::new("email", "Enter your work email"));
        }
        if password.is_empty() {
            errors.push(FieldError::new("password", "Enter your password"));
        }
        if !errors.is_empty() {
            return Err(DeskError::Validation { errors });
        }

        let user = self.generator.generate(email, self.clock.now());
        log::info!("signed in {} ({})", user.email, user.id);
        self.store.set_state(
            StatePatch::new()
                .set(keys::IS_AUTHENTICATED, true)
                .set_serialized(keys::REFERRALS, &user.referrals)
                .set_serialized(keys::CURRENT_USER, &user),
        );
        Ok(self.navigate(DASHBOARD_ROUTE))
    }

    pub fn logout(&mut self) -> Navigation {
        log::info!("signed out");
        self.store.reset();
        self.navigate(LOGIN_ROUTE)
    }

    // ── Navigation ─────────────────────────────────────────────────

    pub fn navigate(&mut self, route: &str) -> Navigation {
        let nav = self.router.navigate(&mut self.store, route);
        self.after_navigation();
        nav
    }

    pub fn back(&mut self) -> Option<Navigation> {
        let nav = self.router.back(&mut self.store);
        self.after_navigation();
        nav
    }

    pub fn forward(&mut self) -> Option<Navigation> {
        let nav = self.router.forward(&mut self.store);
        self.after_navigation();
        nav
    }

    /// Open a referral's detail page. The id must exist in `referrals`.
    pub fn select_referral(&mut self, referral_id: &str) -> DeskResult<Navigation> {
        let exists = self.referrals().iter().any(|r| r.id == referral_id);
        if !exists {
            return Err(DeskError::Validation {
                errors: vec![FieldError::new("referral_id", "Unknown referral")],
            });
        }
        self.store
            .set_state(StatePatch::new().set(keys::SELECTED_REFERRAL, referral_id));
        Ok(self.navigate(DETAIL_ROUTE))
    }

    pub fn selected_referral(&self) -> Option<ReferralRecord> {
        let id: String = self.store.get_as(keys::SELECTED_REFERRAL)?;
        self.referrals().into_iter().find(|r| r.id == id)
    }

    fn after_navigation(&mut self) {
        let mounts: Vec<ViewName> = self.pages.borrow_mut().pending_mounts.drain(..).collect();
        let dashboard_view = self.router.table().view_for(DASHBOARD_ROUTE).map(str::to_owned);
        for view in mounts {
            if dashboard_view.as_deref() == Some(view.as_str()) {
                self.refresh_trend();
            }
        }
    }

    // ── Referrals ──────────────────────────────────────────────────

    pub fn set_filters(&mut self, filters: &ReferralFilters) {
        self.store
            .set_state(StatePatch::new().set_serialized(keys::REFERRAL_FILTERS, filters));
    }

    pub fn filters(&self) -> ReferralFilters {
        self.store.get_as(keys::REFERRAL_FILTERS).unwrap_or_default()
    }

    pub fn filtered_referrals(&self) -> Vec<ReferralRecord> {
        let referrals = self.referrals();
        filter_referrals(&referrals, &self.filters())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Submit a referral on behalf of the signed-in user. The submit is
    /// bound to the mounted view's token: if that token is cancelled
    /// while the request is pending (see `view_token`), nothing is
    /// applied and the store is left untouched.
    pub async fn submit_referral(&mut self, form: ReferralForm) -> DeskResult<SubmissionReceipt> {
        if !self.store.is_authenticated() {
            return Err(DeskError::NotAuthenticated);
        }
        let token = self.view_token();
        let now = self.clock.now();
        let campaigns = self.config.campaigns_at(now);

        let receipt = self
            .submissions
            .submit(form, &campaigns, now, &token)
            .await?;
        if token.is_cancelled() {
            return Err(DeskError::Cancelled);
        }

        self.apply_submission(&receipt);
        Ok(receipt)
    }

    fn apply_submission(&mut self, receipt: &SubmissionReceipt) {
        let mut referrals = self.referrals();
        referrals.insert(0, receipt.referral.clone());

        let mut patch = StatePatch::new()
            .set_serialized(keys::REFERRALS, &referrals)
            .set(
                keys::TOAST,
                json!({
                    "kind": "success",
                    "message": format!("Referral submitted! +{} points", receipt.points.total),
                }),
            );

        if let Some(mut user) = self.current_user() {
            let today = receipt.referral.submitted_at;
            let first = user.referrals.is_empty();
            user.referrals.insert(0, receipt.referral.clone());

            if first {
                push_stamp(&mut user, StampKind::FirstReferral, StampKind::FirstReferral.points(), &receipt.referral);
            }
            push_stamp(&mut user, StampKind::ReferralSubmitted, receipt.points.total, &receipt.referral);
            user.activities.insert(
                0,
                Activity {
                    date:        today,
                    kind:        ActivityKind::StatusChange,
                    description: format!(
                        "{} · {}: {}",
                        receipt.referral.candidate.name,
                        receipt.referral.position_title,
                        ReferralStatus::Submitted.label()
                    ),
                    points:      receipt.points.total,
                },
            );
            user.activities.truncate(MAX_ACTIVITIES);
            patch = patch.set_serialized(keys::CURRENT_USER, &user);
        }

        self.store.set_state(patch);
    }

    // ── Derived views ──────────────────────────────────────────────

    /// Recompute the trend against the stored baseline and cache it in
    /// `pointsTrend`. Runs once per dashboard mount.
    fn refresh_trend(&mut self) {
        let Some(user) = self.current_user() else {
            return;
        };
        let counts = StatusCounts::from_referrals(&self.referrals());
        let snapshot = StatsSnapshot::new(&counts, user.points());
        let delta = self
            .trend
            .scoped(&user.id)
            .compute(self.store.storage_mut(), &snapshot);
        self.store
            .set_state(StatePatch::new().set_serialized(keys::POINTS_TREND, &delta));
    }

    pub fn dashboard(&self) -> DeskResult<DashboardSummary> {
        let user = self.current_user().ok_or(DeskError::NotAuthenticated)?;
        let referrals = self.referrals();
        let counts = StatusCounts::from_referrals(&referrals);
        let trend = match self.store.get_as::<TrendDelta>(keys::POINTS_TREND) {
            Some(delta) => delta,
            None => self
                .trend
                .scoped(&user.id)
                .peek(self.store.storage(), &StatsSnapshot::new(&counts, user.points())),
        };
        let now = self.clock.now();
        let campaigns = self.config.campaigns_at(now);
        let active_campaigns = active_campaigns(&campaigns, now)
            .into_iter()
            .map(|c| campaign_status(c, now))
            .collect();

        Ok(DashboardSummary {
            display_name: user.display_name(),
            points: user.points(),
            level: user.level(),
            counts,
            trend,
            active_campaigns,
            recent_activity: user.activities.iter().take(5).cloned().collect(),
        })
    }

    /// Open positions with their campaign-adjusted hire reward.
    pub fn position_rewards(&self) -> Vec<PositionReward> {
        let now = self.clock.now();
        let campaigns = self.config.campaigns_at(now);
        self.config
            .positions
            .iter()
            .filter(|p| p.open)
            .map(|p| {
                let campaign = best_campaign_for(p, &campaigns, now);
                PositionReward {
                    position:    p.clone(),
                    hire_reward: campaign_adjusted_points(StampKind::HireBonus.points(), campaign),
                    campaign_id: campaign.map(|c| c.id.clone()),
                }
            })
            .collect()
    }

    pub fn set_campaign_filter(&mut self, filter: CampaignFilter) {
        self.store
            .set_state(StatePatch::new().set_serialized(keys::CAMPAIGN_FILTER, &filter));
    }

    /// Campaigns matching the `campaignFilter` key.
    pub fn visible_campaigns(&self) -> Vec<CampaignStatus> {
        let now = self.clock.now();
        let filter: CampaignFilter = self.store.get_as(keys::CAMPAIGN_FILTER).unwrap_or_default();
        self.config
            .campaigns_at(now)
            .iter()
            .filter(|c| filter.matches(c, now))
            .map(|c| campaign_status(c, now))
            .collect()
    }

    /// Refresh a campaign countdown every `period` for as long as the
    /// current view stays mounted.
    pub async fn watch_countdown<F>(
        &self,
        campaign_id: &str,
        period: Duration,
        on_tick: F,
    ) -> DeskResult<usize>
    where
        F: FnMut(Countdown),
    {
        let campaign = self
            .config
            .campaigns_at(self.clock.now())
            .into_iter()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| DeskError::Validation {
                errors: vec![FieldError::new("campaign_id", "Unknown campaign")],
            })?;
        let token = self.view_token();
        Ok(run_countdown(&campaign, self.clock, period, &token, on_tick).await)
    }

    // ── Errors ─────────────────────────────────────────────────────

    /// Global handler: log and raise the generic toast.
    pub fn report_error(&mut self, err: &DeskError) {
        log::error!("{err}");
        self.store.set_state(StatePatch::new().set(
            keys::TOAST,
            json!({ "kind": "error", "message": GENERIC_ERROR_MESSAGE }),
        ));
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Run one command and describe the result as JSON.
    pub async fn execute(&mut self, command: AppCommand) -> DeskResult<Value> {
        let value = match command {
            AppCommand::Start { fragment } => serde_json::to_value(self.start(fragment.as_deref()))?,
            AppCommand::Login { email, password } => {
                serde_json::to_value(self.login(&email, &password)?)?
            }
            AppCommand::Logout => serde_json::to_value(self.logout())?,
            AppCommand::Navigate { route } => serde_json::to_value(self.navigate(&route))?,
            AppCommand::Back => serde_json::to_value(self.back())?,
            AppCommand::Forward => serde_json::to_value(self.forward())?,
            AppCommand::SelectReferral { referral_id } => {
                serde_json::to_value(self.select_referral(&referral_id)?)?
            }
            AppCommand::Submit { form } => {
                let receipt = self.submit_referral(form).await?;
                json!({ "referral": receipt.referral, "points": receipt.points })
            }
            AppCommand::SetFilters { filters } => {
                self.set_filters(&filters);
                serde_json::to_value(self.filtered_referrals())?
            }
            AppCommand::SetCampaignFilter { filter } => {
                self.set_campaign_filter(filter);
                serde_json::to_value(self.visible_campaigns())?
            }
            AppCommand::Dashboard => serde_json::to_value(self.dashboard()?)?,
            AppCommand::Referrals => serde_json::to_value(self.filtered_referrals())?,
            AppCommand::Positions => serde_json::to_value(self.position_rewards())?,
            AppCommand::Campaigns => serde_json::to_value(self.visible_campaigns())?,
            AppCommand::GetState => json!({
                "view": self.mounted_view(),
                "fragment": self.router.location().fragment(),
                "can_go_back": self.router.location().can_go_back(),
                "can_go_forward": self.router.location().can_go_forward(),
                "authenticated": self.store.is_authenticated(),
                "toast": self.store.get(keys::TOAST),
            }),
        };
        Ok(value)
    }
}

fn campaign_status(c: &CampaignRecord, now: chrono::DateTime<chrono::Utc>) -> CampaignStatus {
    CampaignStatus {
        id:             c.id.clone(),
        title:          c.title.clone(),
        multiplier:     c.multiplier,
        active:         c.is_active(now),
        time_remaining: c.time_remaining(now),
    }
}

fn push_stamp(user: &mut UserRecord, kind: StampKind, points: u32, referral: &ReferralRecord) {
    let id = format!("{}-s{:03}", user.id, user.stamps.len() + 1);
    user.stamps.push(Stamp {
        id,
        kind,
        points,
        earned_at: referral.submitted_at,
        referral_id: Some(referral.id.clone()),
    });
}
