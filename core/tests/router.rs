//! Router: guards, unknown routes, history.

use referral_core::{
    config::AppConfig,
    router::{Navigation, RouteTable, Router, NOT_FOUND_VIEW},
    state::{keys, StatePatch, StateStore},
    storage::MemoryStorage,
};

// ── Test helpers ───────────────────────────────────────────────────

fn setup() -> (Router, StateStore) {
    let config = AppConfig::default_test();
    let router = Router::new(RouteTable::from_config(&config.routes));
    let store = StateStore::new(Box::new(MemoryStorage::new()), &config);
    (router, store)
}

fn sign_in(store: &mut StateStore) {
    store.set_state(StatePatch::new().set(keys::IS_AUTHENTICATED, true));
}

// ── Guards ─────────────────────────────────────────────────────────

/// Signed out, every protected route bounces to login.
#[test]
fn protected_routes_redirect_to_login() {
    let (mut router, mut store) = setup();
    for route in ["dashboard", "referrals", "refer", "profile"] {
        let nav = router.navigate(&mut store, route);
        assert_eq!(
            nav,
            Navigation::Redirected {
                requested: route.into(),
                route:     "login".into(),
                view:      "login".into(),
            },
            "{route} should redirect to login while signed out"
        );
        assert_eq!(store.current_view(), Some("login"));
    }
}

#[test]
fn login_is_guest_only() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    let nav = router.navigate(&mut store, "login");
    assert_eq!(nav.route(), "dashboard");
    assert_eq!(store.current_view(), Some("dashboard"));
}

#[test]
fn authenticated_navigation_resolves() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    let nav = router.navigate(&mut store, "campaigns");
    assert_eq!(
        nav,
        Navigation::Resolved {
            route: "campaigns".into(),
            view:  "campaigns".into(),
        }
    );
    assert_eq!(router.location().fragment(), "#campaigns");
}

/// Unknown routes mount the not-found view; navigation never errors.
#[test]
fn unknown_route_shows_not_found() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    let nav = router.navigate(&mut store, "does-not-exist");
    assert_eq!(nav, Navigation::NotFound { requested: "does-not-exist".into() });
    assert_eq!(store.current_view(), Some(NOT_FOUND_VIEW));
}

#[test]
fn resolve_has_no_side_effects() {
    let (router, store) = setup();
    let nav = router.resolve(true, "positions");
    assert_eq!(nav.view(), "positions");
    assert_eq!(store.current_view(), Some("login"));
    assert_eq!(router.location().current(), None);
}

// ── Initial fragment ───────────────────────────────────────────────

#[test]
fn initial_fragment_is_honored_when_allowed() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    let nav = router.initial(&mut store, Some("#/referrals?status=hired"));
    assert_eq!(nav.route(), "referrals");
}

#[test]
fn missing_or_unknown_fragment_lands_by_auth() {
    let (mut router, mut store) = setup();
    assert_eq!(router.initial(&mut store, None).route(), "login");

    sign_in(&mut store);
    let (mut router, _) = setup();
    assert_eq!(router.initial(&mut store, Some("#nowhere")).route(), "dashboard");
}

// ── History ────────────────────────────────────────────────────────

#[test]
fn back_and_forward_replay_history() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    router.navigate(&mut store, "dashboard");
    router.navigate(&mut store, "referrals");
    router.navigate(&mut store, "campaigns");

    let back = router.back(&mut store).expect("history has entries");
    assert_eq!(back.route(), "referrals");
    assert_eq!(store.current_view(), Some("referrals"));

    let fwd = router.forward(&mut store).expect("forward entry exists");
    assert_eq!(fwd.route(), "campaigns");
    assert!(router.forward(&mut store).is_none(), "No forward history at the end");
}

/// After sign-out, stepping back into a protected page re-applies the
/// guard and rewrites that history entry.
#[test]
fn history_steps_reapply_guards() {
    let (mut router, mut store) = setup();
    sign_in(&mut store);
    router.navigate(&mut store, "dashboard");
    router.navigate(&mut store, "rewards");

    store.reset();
    let nav = router.back(&mut store).expect("history has entries");
    assert_eq!(nav.route(), "login");
    assert_eq!(router.location().current(), Some("login"));
    assert_eq!(store.current_view(), Some("login"));
}
