use trialock_core::LicenseError;
use trialock_core::fingerprint::{FINGERPRINT_LEN, Fingerprint, MarkerSource, fallback_sources, privileged_sources};

/// A source with a canned marker.
struct Static(&'static str);

impl MarkerSource for Static {
    fn name(&self) -> &'static str {
        "static"
    }

    fn marker(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// A source that never yields.
struct Unavailable;

impl MarkerSource for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn marker(&self) -> Option<String> {
        None
    }
}

/// Coerces a literal list into a source chain.
fn chain(list: Vec<Box<dyn MarkerSource>>) -> Vec<Box<dyn MarkerSource>> {
    list
}

// ── Current machine ──────────────────────────────────────────────

#[test]
fn current_is_stable_within_a_process() {
    assert_eq!(Fingerprint::current(), Fingerprint::current());
}

#[test]
fn current_is_32_uppercase_hex() {
    let fingerprint = Fingerprint::current();

    assert_eq!(fingerprint.as_str().len(), FINGERPRINT_LEN);
    assert!(fingerprint.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(fingerprint.as_str(), fingerprint.as_str().to_ascii_uppercase());
}

#[test]
fn default_chains_never_fail() {
    // Whatever this environment exposes, aggregation must produce a value.
    let fingerprint = Fingerprint::from_sources(&privileged_sources(), &fallback_sources());
    assert_eq!(fingerprint.as_str().len(), FINGERPRINT_LEN);
}

// ── Aggregation over injected sources ────────────────────────────

#[test]
fn same_markers_same_fingerprint() {
    let first = Fingerprint::from_sources(&chain(vec![Box::new(Static("alpha")), Box::new(Static("beta"))]), &[]);
    let second = Fingerprint::from_sources(&chain(vec![Box::new(Static("alpha")), Box::new(Static("beta"))]), &[]);

    assert_eq!(first, second);
}

#[test]
fn different_markers_different_fingerprint() {
    let first = Fingerprint::from_sources(&chain(vec![Box::new(Static("alpha"))]), &[]);
    let second = Fingerprint::from_sources(&chain(vec![Box::new(Static("beta"))]), &[]);

    assert_ne!(first, second);
}

#[test]
fn marker_order_matters() {
    let first = Fingerprint::from_sources(&chain(vec![Box::new(Static("alpha")), Box::new(Static("beta"))]), &[]);
    let second = Fingerprint::from_sources(&chain(vec![Box::new(Static("beta")), Box::new(Static("alpha"))]), &[]);

    assert_ne!(first, second);
}

#[test]
fn fallback_used_when_privileged_unavailable() {
    let degraded = Fingerprint::from_sources(
        &chain(vec![Box::new(Unavailable)]),
        &chain(vec![Box::new(Static("backup"))]),
    );
    let direct = Fingerprint::from_sources(&chain(vec![Box::new(Static("backup"))]), &[]);

    assert_eq!(degraded, direct);
}

#[test]
fn fallback_ignored_when_privileged_available() {
    let both = Fingerprint::from_sources(
        &chain(vec![Box::new(Static("primary"))]),
        &chain(vec![Box::new(Static("backup"))]),
    );
    let primary_only = Fingerprint::from_sources(&chain(vec![Box::new(Static("primary"))]), &[]);

    assert_eq!(both, primary_only);
}

#[test]
fn placeholder_markers_are_skipped() {
    let with_placeholders = Fingerprint::from_sources(
        &chain(vec![
            Box::new(Static("To be filled by O.E.M.")),
            Box::new(Static("")),
            Box::new(Static("00:00:00:00:00:00")),
            Box::new(Static("real-marker")),
        ]),
        &[],
    );
    let clean = Fingerprint::from_sources(&chain(vec![Box::new(Static("real-marker"))]), &[]);

    assert_eq!(with_placeholders, clean);
}

#[test]
fn nothing_available_still_produces_a_fingerprint() {
    let fingerprint = Fingerprint::from_sources(&chain(vec![Box::new(Unavailable)]), &chain(vec![Box::new(Unavailable)]));
    assert_eq!(fingerprint.as_str().len(), FINGERPRINT_LEN);
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_round_trips_current() {
    let fingerprint = Fingerprint::current();
    assert_eq!(Fingerprint::parse(fingerprint.as_str()).unwrap(), fingerprint);
}

#[test]
fn parse_normalizes_case_and_whitespace() {
    let parsed = Fingerprint::parse("  00aabbccddeeff112233445566778899  ").unwrap();
    assert_eq!(parsed.as_str(), "00AABBCCDDEEFF112233445566778899");
}

#[test]
fn parse_rejects_bad_input() {
    assert!(matches!(Fingerprint::parse(""), Err(LicenseError::InvalidFingerprint)));
    assert!(matches!(Fingerprint::parse("abc"), Err(LicenseError::InvalidFingerprint)));
    assert!(matches!(
        Fingerprint::parse("ZZ112233445566778899AABBCCDDEEFF"),
        Err(LicenseError::InvalidFingerprint),
    ));
    assert!(matches!(
        Fingerprint::parse("00112233445566778899AABBCCDDEEFF00"),
        Err(LicenseError::InvalidFingerprint),
    ));
}
