//! End-to-end scenario tests, built on the in-memory `FakeHost` double
//! (`src/test_support.rs`), mirroring the teacher's `tests/cookie.rs`
//! integration harness but driving `EngineState` instead of an `Agent`
//! against a `tide` server. Requires the `test-support` feature.

#![cfg(feature = "test-support")]

use std::time::Duration;

use http::{header, HeaderMap, HeaderValue, Uri};

use tabjar::cleanup;
use tabjar::config::{EngineConfig, Tier};
use tabjar::ids::TabId;
use tabjar::init::InitState;
use tabjar::interceptor::RequestOutcome;
use tabjar::lifecycle::{CloseOutcome, InheritanceDecision};
use tabjar::persistence::PersistenceManager;
use tabjar::test_support::{FakeCrossDeviceStore, FakeKvStore, FakeObjectStore};
use tabjar::EngineState;

fn uri(s: &str) -> Uri {
    s.parse().unwrap()
}

async fn booted_engine(tier: Tier) -> (EngineState, PersistenceManager<FakeKvStore, FakeObjectStore, FakeCrossDeviceStore>) {
    let persistence = PersistenceManager::new(
        FakeKvStore::default(),
        FakeObjectStore::default(),
        Some(FakeCrossDeviceStore::default()),
        Duration::from_millis(10),
    );
    let mut engine = EngineState::new(EngineConfig::default(), tier);
    let state = engine.initialize(&persistence).await;
    assert_eq!(state, InitState::Ready);
    (engine, persistence)
}

/// Scenario 1: zero cookies on first request, `Set-Cookie` captured and
/// stripped, the next request on the same tab carries it, and a parallel
/// unbound tab never sees it.
#[tokio::test]
async fn scenario_one_basic_substitution() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let sid = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();

    let url = uri("https://example.com/");
    let mut first_request = HeaderMap::new();
    let outcome = engine.on_request(TabId::new(1), &url, &mut first_request, 0);
    assert_eq!(outcome, RequestOutcome::Applied { session: sid.clone(), cookie_count: 0 });

    let mut response = HeaderMap::new();
    response.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com; Path=/; Secure"));
    engine.on_response(TabId::new(1), &url, &mut response, 0);
    assert!(response.get(header::SET_COOKIE).is_none());

    let mut second_request = HeaderMap::new();
    engine.on_request(TabId::new(1), &url, &mut second_request, 1);
    assert_eq!(second_request.get(header::COOKIE).unwrap(), "sid=alice");

    let mut third_tab_request = HeaderMap::new();
    let outcome = engine.on_request(TabId::new(2), &url, &mut third_tab_request, 1);
    assert_eq!(outcome, RequestOutcome::Unbound);
}

/// Scenario 2: two independent sessions never see each other's cookies.
#[tokio::test]
async fn scenario_two_isolated_sessions() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let s1 = engine.create_session(Tier::Free, None, 0).unwrap();
    let s2 = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &s1).unwrap();
    engine.bind_tab(TabId::new(2), &s2).unwrap();

    let url = uri("https://example.com/");
    let mut resp1 = HeaderMap::new();
    resp1.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com"));
    engine.on_response(TabId::new(1), &url, &mut resp1, 0);

    let mut resp2 = HeaderMap::new();
    resp2.insert(header::SET_COOKIE, HeaderValue::from_static("sid=bob; Domain=example.com"));
    engine.on_response(TabId::new(2), &url, &mut resp2, 0);

    let mut req1 = HeaderMap::new();
    engine.on_request(TabId::new(1), &url, &mut req1, 1);
    assert_eq!(req1.get(header::COOKIE).unwrap(), "sid=alice");

    let mut req2 = HeaderMap::new();
    engine.on_request(TabId::new(2), &url, &mut req2, 1);
    assert_eq!(req2.get(header::COOKIE).unwrap(), "sid=bob");
}

/// Scenario 3: a page-script cookie write is visible to a follow-up
/// `document.cookie` read and is merged with a server-set cookie.
#[tokio::test]
async fn scenario_three_page_bridge_merges_with_server_cookies() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let sid = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();

    let url = uri("https://example.com/");
    let mut resp = HeaderMap::new();
    resp.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com"));
    engine.on_response(TabId::new(1), &url, &mut resp, 0);

    assert!(engine.document_cookie_set(&sid, &url, "p=1", 100));

    let rendered = engine.document_cookie_get(&sid, &url, 100);
    let mut parts: Vec<_> = rendered.split("; ").collect();
    parts.sort();
    assert_eq!(parts, vec!["p=1", "sid=alice"]);
}

/// Scenario 4: a popup opened from a bound tab inherits the session
/// immediately, before any persistence debounce would otherwise elapse.
#[tokio::test]
async fn scenario_four_popup_inherits_opener_session() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let sid = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();

    let decision = engine.on_tab_created(
        TabId::new(2),
        Some(TabId::new(1)),
        "https://example.com/report",
        Some("example.com"),
        0,
    );
    assert_eq!(decision, InheritanceDecision::FromOpener(sid.clone()));

    let url = uri("https://example.com/report");
    let mut resp = HeaderMap::new();
    resp.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com"));
    engine.on_response(TabId::new(1), &uri("https://example.com/"), &mut resp, 0);

    let mut popup_request = HeaderMap::new();
    engine.on_request(TabId::new(2), &url, &mut popup_request, 1);
    assert_eq!(popup_request.get(header::COOKIE).unwrap(), "sid=alice");
}

/// Scenario 5: closing every tab of a Free session leaves it Dormant with
/// cookies retained; reopening (re-binding a fresh tab) still serves them.
#[tokio::test]
async fn scenario_five_dormant_session_retains_cookies() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let sid = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();

    let url = uri("https://example.com/");
    let mut resp = HeaderMap::new();
    resp.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com"));
    engine.on_response(TabId::new(1), &url, &mut resp, 0);

    let outcome = engine.on_tab_closed(TabId::new(1));
    assert_eq!(outcome, CloseOutcome::Dormant(sid.clone()));

    engine.bind_tab(TabId::new(5), &sid).unwrap();
    let mut req = HeaderMap::new();
    engine.on_request(TabId::new(5), &url, &mut req, 1);
    assert_eq!(req.get(header::COOKIE).unwrap(), "sid=alice");
}

/// Scenario 5, Enterprise variant: auto-restore deletes the session
/// (and its jar) outright instead of leaving it Dormant.
#[tokio::test]
async fn scenario_five_enterprise_auto_restore_deletes_instead_of_dormant() {
    let (mut engine, _persistence) = booted_engine(Tier::Enterprise).await;
    engine.set_auto_restore(true, false).unwrap();
    let sid = engine.create_session(Tier::Enterprise, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();

    let outcome = engine.on_tab_closed(TabId::new(1));
    assert_eq!(outcome, CloseOutcome::Deleted(sid));
}

/// Scenario 6: a Free-tier user at the 3-session limit is denied a 4th,
/// then closing one session allows it again.
#[tokio::test]
async fn scenario_six_free_tier_limit_then_recovery() {
    let (mut engine, _persistence) = booted_engine(Tier::Free).await;
    let mut sessions = Vec::new();
    for i in 0..3u32 {
        let sid = engine.create_session(Tier::Free, None, 0).unwrap();
        engine.bind_tab(TabId::new(i), &sid).unwrap();
        sessions.push(sid);
    }
    assert!(!engine.can_create_session().allowed);
    assert!(engine.create_session(Tier::Free, None, 0).is_err());

    engine.on_tab_closed(TabId::new(0));
    assert!(engine.can_create_session().allowed);
    assert!(engine.create_session(Tier::Free, None, 0).is_ok());
}

/// A full persist-then-rehydrate round trip through the fake L1/L2/L3
/// tiers, exercising the actual `PersistenceManager` rather than calling
/// `snapshot`/`rehydrate` directly.
#[tokio::test]
async fn persisted_state_survives_a_restart() {
    let (mut engine, persistence) = booted_engine(Tier::Free).await;
    let sid = engine.create_session(Tier::Free, None, 0).unwrap();
    engine.bind_tab(TabId::new(1), &sid).unwrap();
    let url = uri("https://example.com/");
    let mut resp = HeaderMap::new();
    resp.insert(header::SET_COOKIE, HeaderValue::from_static("sid=alice; Domain=example.com"));
    engine.on_response(TabId::new(1), &url, &mut resp, 0);

    let snap = engine.snapshot(0);
    persistence.persist(snap, true).await.unwrap();

    let mut restarted = EngineState::new(EngineConfig::default(), Tier::Free);
    let state = restarted.initialize(&persistence).await;
    assert_eq!(state, InitState::Ready);

    assert_eq!(restarted.get_session_for_tab(TabId::new(1)), Some(sid.clone()));
    let mut req = HeaderMap::new();
    restarted.on_request(TabId::new(1), &url, &mut req, 1);
    assert_eq!(req.get(header::COOKIE).unwrap(), "sid=alice");
}

#[test]
fn expiry_sweep_boundary_property_is_idempotent() {
    use tabjar::cookie::{Cookie, CookieStore};
    use tabjar::ids::SessionId;

    let mut cookies = CookieStore::new();
    let sid = SessionId::from("s1");
    let url = uri("https://example.com/");
    let mut c = Cookie::new("a", "1", "example.com");
    c.expires = Some(50);
    cookies.put(&sid, &url, c, 0);

    cleanup::expiry_sweep(&mut cookies, 1_000);
    let after_first = cookies.get(&sid, &url, 1_000);
    cleanup::expiry_sweep(&mut cookies, 1_000);
    let after_second = cookies.get(&sid, &url, 1_000);
    assert_eq!(after_first, after_second);
    assert!(after_first.is_empty());
}
