use crate::{campaign::CampaignFilter, stats::ReferralFilters, submission::ReferralForm};
use serde::{Deserialize, Serialize};

/// Every user-issued command the desk understands.
/// One JSON object per line on the runner's stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AppCommand {
    // ── Session ───────────────────────────────────
    Start {
        #[serde(default)]
        fragment: Option<String>,
    },
    Login {
        email:    String,
        password: String,
    },
    Logout,

    // ── Navigation ────────────────────────────────
    Navigate {
        route: String,
    },
    Back,
    Forward,
    SelectReferral {
        referral_id: String,
    },

    // ── Referrals ─────────────────────────────────
    Submit {
        form: ReferralForm,
    },
    SetFilters {
        filters: ReferralFilters,
    },
    SetCampaignFilter {
        filter: CampaignFilter,
    },

    // ── Reads ─────────────────────────────────────
    Dashboard,
    Referrals,
    Positions,
    Campaigns,
    GetState,
}
