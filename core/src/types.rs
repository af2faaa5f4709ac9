//! Shared primitive types used across the referral desk.

/// A stable identifier for a user profile (`usr-xxxxxxxx`).
pub type UserId = String;

/// A stable identifier for a referral record.
pub type ReferralId = String;

/// A position identifier from the positions table.
pub type PositionId = String;

/// A campaign identifier from the campaigns table.
pub type CampaignId = String;

/// A logical route name as it appears in the URL fragment (`#dashboard`).
pub type RouteName = String;

/// A page-level view identifier.
pub type ViewName = String;
