use crate::{
    campaign::CampaignRecord,
    types::{CampaignId, PositionId, RouteName, ViewName},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ── Positions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id:         PositionId,
    pub title:      String,
    pub department: String,
    pub location:   String,
    #[serde(default = "default_true")]
    pub open:       bool,
}

#[derive(Debug, Clone, Deserialize)]
struct PositionsFile {
    positions: Vec<Position>,
}

#[derive(Debug, Clone, Deserialize)]
struct DepartmentsFile {
    departments: Vec<String>,
}

// ── Campaigns ──────────────────────────────────────────────────────

/// A campaign window expressed relative to "now", so the demo tables
/// never go stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignConfig {
    pub id:              CampaignId,
    pub title:           String,
    pub multiplier:      f64,
    #[serde(default)]
    pub departments:     Vec<String>,
    #[serde(default)]
    pub position_ids:    Vec<PositionId>,
    /// Negative values start in the future.
    pub started_days_ago: i64,
    pub duration_days:   i64,
}

impl CampaignConfig {
    pub fn resolve(&self, now: DateTime<Utc>) -> CampaignRecord {
        let starts_at = now - Duration::days(self.started_days_ago);
        CampaignRecord {
            id:           self.id.clone(),
            title:        self.title.clone(),
            multiplier:   self.multiplier,
            departments:  self.departments.clone(),
            position_ids: self.position_ids.clone(),
            starts_at,
            ends_at:      starts_at + Duration::days(self.duration_days),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CampaignsFile {
    campaigns: Vec<CampaignConfig>,
}

// ── Routes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub name:          RouteName,
    pub view:          ViewName,
    #[serde(default = "default_true")]
    pub requires_auth: bool,
    /// Only reachable while signed out (the login page).
    #[serde(default)]
    pub guest_only:    bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RoutesFile {
    routes: Vec<RouteConfig>,
}

// ── Storage and latency ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Prefix shared by every key this app owns.
    pub namespace:   String,
    pub state_key:   String,
    pub trend_key:   String,
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace:   "referral-desk".into(),
            state_key:   "referral-desk:state".into(),
            trend_key:   "referral-desk:stats-snapshot".into(),
            quota_bytes: None,
        }
    }
}

/// Simulated network latency bounds, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatencyConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LatencyConfig {
    pub const NONE: LatencyConfig = LatencyConfig { min_ms: 0, max_ms: 0 };
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            min_ms: 400,
            max_ms: 900,
        }
    }
}

pub const DEFAULT_NOTIFY_DEPTH_LIMIT: usize = 16;

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub departments:        Vec<String>,
    pub positions:          Vec<Position>,
    pub campaigns:          Vec<CampaignConfig>,
    pub routes:             Vec<RouteConfig>,
    pub storage:            StorageConfig,
    pub latency:            LatencyConfig,
    pub notify_depth_limit: usize,
}

impl AppConfig {
    /// Load the static tables from the data/ directory.
    /// In tests, use AppConfig::default_demo().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let routes_path = format!("{data_dir}/routes.json");
        let routes_content = std::fs::read_to_string(&routes_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {routes_path}: {e}"))?;
        let routes_file: RoutesFile = serde_json::from_str(&routes_content)?;

        let positions_path = format!("{data_dir}/positions.json");
        let positions_content = std::fs::read_to_string(&positions_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {positions_path}: {e}"))?;
        let positions_file: PositionsFile = serde_json::from_str(&positions_content)?;

        let campaigns_path = format!("{data_dir}/campaigns.json");
        let campaigns_content = std::fs::read_to_string(&campaigns_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {campaigns_path}: {e}"))?;
        let campaigns_file: CampaignsFile = serde_json::from_str(&campaigns_content)?;

        let departments_path = format!("{data_dir}/departments.json");
        let departments_content = std::fs::read_to_string(&departments_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {departments_path}: {e}"))?;
        let departments_file: DepartmentsFile = serde_json::from_str(&departments_content)?;

        if positions_file.positions.is_empty() {
            anyhow::bail!("{positions_path} defines no positions");
        }
        if departments_file.departments.is_empty() {
            anyhow::bail!("{departments_path} defines no departments");
        }

        Ok(Self {
            departments:        departments_file.departments,
            positions:          positions_file.positions,
            campaigns:          campaigns_file.campaigns,
            routes:             routes_file.routes,
            storage:            StorageConfig::default(),
            latency:            LatencyConfig::default(),
            notify_depth_limit: DEFAULT_NOTIFY_DEPTH_LIMIT,
        })
    }

    /// Hardcoded tables for unit tests and data-dir-less runs.
    pub fn default_demo() -> Self {
        let departments = vec![
            "Engineering".to_string(),
            "Product".to_string(),
            "Design".to_string(),
            "Sales".to_string(),
            "Operations".to_string(),
        ];

        let positions = vec![
            position("pos-001", "Senior Backend Engineer", "Engineering", "Tel Aviv"),
            position("pos-002", "Frontend Engineer", "Engineering", "Tel Aviv"),
            position("pos-003", "DevOps Engineer", "Engineering", "Haifa"),
            position("pos-004", "Product Manager", "Product", "Tel Aviv"),
            position("pos-005", "Product Designer", "Design", "Remote"),
            position("pos-006", "Account Executive", "Sales", "Jerusalem"),
            position("pos-007", "Customer Success Manager", "Sales", "Remote"),
            position("pos-008", "Data Analyst", "Operations", "Haifa"),
        ];

        let campaigns = vec![
            CampaignConfig {
                id:               "cmp-eng-double".into(),
                title:            "Engineering Double Points".into(),
                multiplier:       2.0,
                departments:      vec!["Engineering".into()],
                position_ids:     vec![],
                started_days_ago: 10,
                duration_days:    30,
            },
            CampaignConfig {
                id:               "cmp-pm-boost".into(),
                title:            "Product Hiring Sprint".into(),
                multiplier:       1.5,
                departments:      vec!["Design".into()],
                position_ids:     vec!["pos-004".into()],
                started_days_ago: 3,
                duration_days:    14,
            },
            CampaignConfig {
                id:               "cmp-summer".into(),
                title:            "Summer Referral Festival".into(),
                multiplier:       1.25,
                departments:      vec![],
                position_ids:     vec![],
                started_days_ago: -20,
                duration_days:    30,
            },
        ];

        Self {
            departments,
            positions,
            campaigns,
            routes: default_routes(),
            storage: StorageConfig::default(),
            latency: LatencyConfig::default(),
            notify_depth_limit: DEFAULT_NOTIFY_DEPTH_LIMIT,
        }
    }

    /// Same tables as `default_demo()` with simulated latency switched off.
    pub fn default_test() -> Self {
        Self {
            latency: LatencyConfig::NONE,
            ..Self::default_demo()
        }
    }

    /// Campaign windows resolved against `now`.
    pub fn campaigns_at(&self, now: DateTime<Utc>) -> Vec<CampaignRecord> {
        self.campaigns.iter().map(|c| c.resolve(now)).collect()
    }
}

fn default_routes() -> Vec<RouteConfig> {
    let route = |name: &str, requires_auth: bool, guest_only: bool| RouteConfig {
        name: name.into(),
        view: name.into(),
        requires_auth,
        guest_only,
    };
    vec![
        route("login", false, true),
        route("dashboard", true, false),
        route("positions", true, false),
        route("referrals", true, false),
        route("referral-detail", true, false),
        route("refer", true, false),
        route("rewards", true, false),
        route("campaigns", true, false),
        route("profile", true, false),
    ]
}

fn position(id: &str, title: &str, department: &str, location: &str) -> Position {
    Position {
        id:         id.into(),
        title:      title.into(),
        department: department.into(),
        location:   location.into(),
        open:       true,
    }
}

fn default_true() -> bool {
    true
}
