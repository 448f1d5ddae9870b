//! End-to-end SCT verification tests

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::Engine;
use rstest::rstest;
use sigstore_crypto::{certificate_from_pem, certificates_to_pem, parse_certificate};
use sigstore_ct::{Advisory, ErrorKind, LogId, SctMode, SctVerifier, CTFE_TARGET};
use sigstore_trust_root::{
    legacy_intermediate, BoxFuture, FetchContext, Role, Target, TargetClient,
    TrustDistribution, TrustSourceResolver,
};
use x509_cert::der::Encode;

const ISSUER: &[u8] = include_bytes!("../test_data/issuer.crt.pem");
const ROOT: &[u8] = include_bytes!("../test_data/root.crt.pem");
const LEAF_EMBEDDED: &[u8] = include_bytes!("../test_data/leaf_embedded.crt.pem");
const LEAF_TWO_SCTS: &[u8] = include_bytes!("../test_data/leaf_two_scts.crt.pem");
const LEAF_TAMPERED: &[u8] = include_bytes!("../test_data/leaf_tampered_sct.crt.pem");
const LEAF_UNKNOWN_LOG: &[u8] = include_bytes!("../test_data/leaf_unknown_log.crt.pem");
const LEAF_MIXED_LOGS: &[u8] = include_bytes!("../test_data/leaf_mixed_logs.crt.pem");
const LEAF_PLAIN: &[u8] = include_bytes!("../test_data/leaf_plain.crt.pem");
const DETACHED: &[u8] = include_bytes!("../test_data/detached_sct.json");
const DETACHED_TAMPERED: &[u8] = include_bytes!("../test_data/detached_sct_tampered.json");
const DETACHED_UNKNOWN_LOG: &[u8] = include_bytes!("../test_data/detached_sct_unknown_log.json");
const CTFE_PEM: &[u8] = include_bytes!("../test_data/ctfe.pub");
const CTFE_LOG_ID: &str = include_str!("../test_data/ctfe.logid.hex");
const RSA_PEM: &[u8] = include_bytes!("../test_data/rsa.pub");

// Certificate from sigstore-conformance happy-path bundle, issued by the
// first-generation Fulcio intermediate
const FULCIO_LEAF_BASE64: &str = "MIIIGTCCB5+gAwIBAgIUBPWs4OPN1kte0mUMGZrZ6ozMVRkwCgYIKoZIzj0EAwMwNzEVMBMGA1UEChMMc2lnc3RvcmUuZGV2MR4wHAYDVQQDExVzaWdzdG9yZS1pbnRlcm1lZGlhdGUwHhcNMjMwNzEyMTU1NjM1WhcNMjMwNzEyMTYwNjM1WjAAMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEVr33uVAPA1SpA5w/mmBF9ariW8E7oizIQKqiYfxwSb1zftqZZX045y3tPbRkIWe+t7MUYliQknQ954rDDEASnKOCBr4wgga6MA4GA1UdDwEB/wQEAwIHgDATBgNVHSUEDDAKBggrBgEFBQcDAzAdBgNVHQ4EFgQUx2TNZkruHC2aCdyIXscI8N/8q2owHwYDVR0jBBgwFoAU39Ppz1YkEZb5qNjpKFWixi4YZD8wgaUGA1UdEQEB/wSBmjCBl4aBlGh0dHBzOi8vZ2l0aHViLmNvbS9zaWdzdG9yZS1jb25mb3JtYW5jZS9leHRyZW1lbHktZGFuZ2Vyb3VzLXB1YmxpYy1vaWRjLWJlYWNvbi8uZ2l0aHViL3dvcmtmbG93cy9leHRyZW1lbHktZGFuZ2Vyb3VzLW9pZGMtYmVhY29uLnltbEByZWZzL2hlYWRzL21haW4wOQYKKwYBBAGDvzABAQQraHR0cHM6Ly90b2tlbi5hY3Rpb25zLmdpdGh1YnVzZXJjb250ZW50LmNvbTAfBgorBgEEAYO/MAECBBF3b3JrZmxvd19kaXNwYXRjaDA2BgorBgEEAYO/MAEDBChhZjc4NWI2ZDNiMGZhMGMwYWExMzA1ZmFlZTdjZTYwMzZlOGQ5MGM0MC0GCisGAQQBg78wAQQEH0V4dHJlbWVseSBkYW5nZXJvdXMgT0lEQyBiZWFjb24wSQYKKwYBBAGDvzABBQQ7c2lnc3RvcmUtY29uZm9ybWFuY2UvZXh0cmVtZWx5LWRhbmdlcm91cy1wdWJsaWMtb2lkYy1iZWFjb24wHQYKKwYBBAGDvzABBgQPcmVmcy9oZWFkcy9tYWluMDsGCisGAQQBg78wAQgELQwraHR0cHM6Ly90b2tlbi5hY3Rpb25zLmdpdGh1YnVzZXJjb250ZW50LmNvbTCBpgYKKwYBBAGDvzABCQSBlwyBlGh0dHBzOi8vZ2l0aHViLmNvbS9zaWdzdG9yZS1jb25mb3JtYW5jZS9leHRyZW1lbHktZGFuZ2Vyb3VzLXB1YmxpYy1vaWRjLWJlYWNvbi8uZ2l0aHViL3dvcmtmbG93cy9leHRyZW1lbHktZGFuZ2Vyb3VzLW9pZGMtYmVhY29uLnltbEByZWZzL2hlYWRzL21haW4wOAYKKwYBBAGDvzABCgQqDChhZjc4NWI2ZDNiMGZhMGMwYWExMzA1ZmFlZTdjZTYwMzZlOGQ5MGM0MB0GCisGAQQBg78wAQsEDwwNZ2l0aHViLWhvc3RlZDBeBgorBgEEAYO/MAEMBFAMTmh0dHBzOi8vZ2l0aHViLmNvbS9zaWdzdG9yZS1jb25mb3JtYW5jZS9leHRyZW1lbHktZGFuZ2Vyb3VzLXB1YmxpYy1vaWRjLWJlYWNvbjA4BgorBgEEAYO/MAENBCoMKGFmNzg1YjZkM2IwZmEwYzBhYTEzMDVmYWVlN2NlNjAzNmU4ZDkwYzQwHwYKKwYBBAGDvzABDgQRDA9yZWZzL2hlYWRzL21haW4wGQYKKwYBBAGDvzABDwQLDAk2MzI1OTY4OTcwNwYKKwYBBAGDvzABEAQpDCdodHRwczovL2dpdGh1Yi5jb20vc2lnc3RvcmUtY29uZm9ybWFuY2UwGQYKKwYBBAGDvzABEQQLDAkxMzE4MDQ1NjMwgaYGCisGAQQBg78wARIEgZcMgZRodHRwczovL2dpdGh1Yi5jb20vc2lnc3RvcmUtY29uZm9ybWFuY2UvZXh0cmVtZWx5LWRhbmdlcm91cy1wdWJsaWMtb2lkYy1iZWFjb24vLmdpdGh1Yi93b3JrZmxvd3MvZXh0cmVtZWx5LWRhbmdlcm91cy1vaWRjLWJlYWNvbi55bWxAcmVmcy9oZWFkcy9tYWluMDgGCisGAQQBg78wARMEKgwoYWY3ODViNmQzYjBmYTBjMGFhMTMwNWZhZWU3Y2U2MDM2ZThkOTBjNDAhBgorBgEEAYO/MAEUBBMMEXdvcmtmbG93X2Rpc3BhdGNoMIGBBgorBgEEAYO/MAEVBHMMcWh0dHBzOi8vZ2l0aHViLmNvbS9zaWdzdG9yZS1jb25mb3JtYW5jZS9leHRyZW1lbHktZGFuZ2Vyb3VzLXB1YmxpYy1vaWRjLWJlYWNvbi9hY3Rpb25zL3J1bnMvNTUzMzc0MTQ5Ny9hdHRlbXB0cy8xMIGKBgorBgEEAdZ5AgQCBHwEegB4AHYA3T0wasbHETJjGR4cmWc3AqJKXrjePK3/h4pygC8p7o4AAAGJStGTCwAABAMARzBFAiBCA4jZQP4CwMiWoeS7WMW46QkI4e7OsNH3yVhf5wdBvgIhAPJYxdsi9NqOXVZsEUtCup8m1m/2zG39FTGlgE0MorDFMAoGCCqGSM49BAMDA2gAMGUCMEYWRwI5QJeOwNCuV4tnZ0n5QNlUlP0BtX5V2ZTQLqcQbWtneC7tLptiYgr0Z62UDQIxAO6ItXAH+sbZcsbj08xr3GApM6hjvyTAl39pS3Y3sZwAz8lfQDHNL4eALEo1heAYVg==";

// The 2022 production CT log key
const FULCIO_CT_KEY_BASE64: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEiPSlFi0CmFTfEjCUqF9HuCEcYXNKAaYalIJmBZ8yyezPjTqhxrKBpMnaocVtLJBI1eM3uXnQzQGAJdJ4gs9Fyw==";

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(name)
}

fn override_verifier() -> SctVerifier {
    SctVerifier::new(TrustSourceResolver::local(test_data("ctfe.pub")))
}

fn ctfe_log_id() -> LogId {
    let bytes = hex::decode(CTFE_LOG_ID.trim()).unwrap();
    LogId::from_slice(&bytes).unwrap()
}

struct FakeDistribution {
    targets: Vec<Target>,
    connects: AtomicUsize,
}

impl FakeDistribution {
    fn new(targets: Vec<Target>) -> Arc<Self> {
        Arc::new(Self {
            targets,
            connects: AtomicUsize::new(0),
        })
    }
}

struct FakeClient {
    targets: Vec<Target>,
}

impl TrustDistribution for FakeDistribution {
    fn connect(&self, _ctx: FetchContext) -> BoxFuture<'_, Box<dyn TargetClient>> {
        Box::pin(async move {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeClient {
                targets: self.targets.clone(),
            }) as Box<dyn TargetClient>)
        })
    }
}

impl TargetClient for FakeClient {
    fn get_targets_by_meta<'a>(
        &'a self,
        _ctx: FetchContext,
        role: Role,
        fallback_names: &'a [&'a str],
    ) -> BoxFuture<'a, Vec<Target>> {
        Box::pin(async move {
            assert_eq!(role, Role::Ctfe);
            assert_eq!(fallback_names, &[CTFE_TARGET]);
            Ok(self.targets.clone())
        })
    }
}

fn remote_verifier(targets: Vec<Target>) -> (SctVerifier, Arc<FakeDistribution>) {
    let distribution = FakeDistribution::new(targets);
    let verifier = SctVerifier::new(TrustSourceResolver::remote(
        Arc::clone(&distribution) as Arc<dyn TrustDistribution>
    ));
    (verifier, distribution)
}

#[tokio::test]
async fn test_embedded_sct_with_override_key() {
    let outcome = override_verifier()
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap();
    assert_eq!(outcome.mode, SctMode::Embedded);
    assert_eq!(outcome.verified, 1);
    assert_eq!(
        outcome.advisories,
        vec![Advisory::NonStandardLogKey {
            path: test_data("ctfe.pub")
        }]
    );
}

#[tokio::test]
async fn test_every_embedded_sct_is_verified() {
    let outcome = override_verifier()
        .verify_sct(&FetchContext::background(), LEAF_TWO_SCTS, ISSUER, &[])
        .await
        .unwrap();
    assert_eq!(outcome.verified, 2);
}

#[rstest]
#[case::tampered_detached(DETACHED_TAMPERED)]
#[case::unknown_log_detached(DETACHED_UNKNOWN_LOG)]
#[case::garbage_detached(b"{ this is not json".as_slice())]
#[tokio::test]
async fn test_embedded_takes_priority_over_detached(#[case] detached: &[u8]) {
    let outcome = override_verifier()
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, detached)
        .await
        .unwrap();
    assert_eq!(outcome.mode, SctMode::Embedded);
}

#[tokio::test]
async fn test_no_sct_is_policy_violation() {
    let err = override_verifier()
        .verify_sct(&FetchContext::background(), LEAF_PLAIN, ISSUER, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);
}

#[tokio::test]
async fn test_detached_sct() {
    let outcome = override_verifier()
        .verify_sct(&FetchContext::background(), LEAF_PLAIN, ISSUER, DETACHED)
        .await
        .unwrap();
    assert_eq!(outcome.mode, SctMode::Detached);
    assert_eq!(outcome.verified, 1);
}

#[rstest]
#[case::tampered(LEAF_PLAIN, DETACHED_TAMPERED, ErrorKind::Verification)]
#[case::detached_unknown_log(LEAF_PLAIN, DETACHED_UNKNOWN_LOG, ErrorKind::TrustNotFound)]
#[case::detached_not_json(LEAF_PLAIN, b"not json".as_slice(), ErrorKind::Config)]
#[case::wrong_issuer(LEAF_EMBEDDED, b"".as_slice(), ErrorKind::Verification)]
#[case::embedded_tampered(LEAF_TAMPERED, b"".as_slice(), ErrorKind::Verification)]
#[case::embedded_unknown_log(LEAF_UNKNOWN_LOG, b"".as_slice(), ErrorKind::TrustNotFound)]
#[case::one_of_two_logs_unknown(LEAF_MIXED_LOGS, b"".as_slice(), ErrorKind::TrustNotFound)]
#[tokio::test]
async fn test_verification_failures(
    #[case] cert: &[u8],
    #[case] detached: &[u8],
    #[case] expected: ErrorKind,
) {
    // Valid embedded SCTs fail when checked against the wrong issuer
    let chain = if cert == LEAF_EMBEDDED { ROOT } else { ISSUER };
    let err = override_verifier()
        .verify_sct(&FetchContext::background(), cert, chain, detached)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), expected, "unexpected error: {}", err);
}

#[tokio::test]
async fn test_unknown_log_with_other_override_key() {
    let verifier = SctVerifier::new(TrustSourceResolver::local(test_data("ctfe_other.pub")));
    let err = verifier
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrustNotFound);
}

#[rstest]
#[case::bad_certificate(b"garbage".as_slice(), ISSUER)]
#[case::empty_chain(LEAF_EMBEDDED, b"".as_slice())]
#[tokio::test]
async fn test_unparsable_input(#[case] cert: &[u8], #[case] chain: &[u8]) {
    let err = override_verifier()
        .verify_sct(&FetchContext::background(), cert, chain, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_missing_override_key_fails_before_parsing() {
    let verifier = SctVerifier::new(TrustSourceResolver::local(test_data("missing.pub")));
    let err = verifier
        .verify_sct(&FetchContext::background(), b"garbage", b"garbage", &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_active_remote_key_has_no_advisories() {
    let (verifier, _) = remote_verifier(vec![Target::active(CTFE_TARGET, CTFE_PEM)]);
    let outcome = verifier
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap();
    assert!(outcome.advisories.is_empty());
}

#[rstest]
#[case::embedded(LEAF_EMBEDDED, b"".as_slice(), SctMode::Embedded)]
#[case::detached(LEAF_PLAIN, DETACHED, SctMode::Detached)]
#[tokio::test]
async fn test_expired_key_yields_advisory(
    #[case] cert: &[u8],
    #[case] detached: &[u8],
    #[case] mode: SctMode,
) {
    let (verifier, _) = remote_verifier(vec![Target::expired(CTFE_TARGET, CTFE_PEM)]);
    let outcome = verifier
        .verify_sct(&FetchContext::background(), cert, ISSUER, detached)
        .await
        .unwrap();
    assert_eq!(outcome.mode, mode);
    assert_eq!(
        outcome.advisories,
        vec![Advisory::ExpiredLogKey {
            log_id: ctfe_log_id(),
            mode
        }]
    );
}

#[tokio::test]
async fn test_expired_key_still_rejects_tampered_sct() {
    let (verifier, _) = remote_verifier(vec![Target::expired(CTFE_TARGET, CTFE_PEM)]);
    let err = verifier
        .verify_sct(&FetchContext::background(), LEAF_TAMPERED, ISSUER, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Verification);
}

#[tokio::test]
async fn test_remote_rejects_non_ecdsa_key() {
    let (verifier, _) = remote_verifier(vec![
        Target::active(CTFE_TARGET, CTFE_PEM),
        Target::active("rsa.pub", RSA_PEM),
    ]);
    let err = verifier
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.message().contains("RSA"));
}

#[tokio::test]
async fn test_remote_without_keys_is_not_found() {
    let (verifier, _) = remote_verifier(Vec::new());
    let err = verifier
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrustNotFound);
}

#[tokio::test]
async fn test_registry_is_rebuilt_for_every_call() {
    let (verifier, distribution) = remote_verifier(vec![Target::active(CTFE_TARGET, CTFE_PEM)]);
    let ctx = FetchContext::background();
    verifier
        .verify_sct(&ctx, LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap();
    verifier
        .verify_sct(&ctx, LEAF_PLAIN, ISSUER, DETACHED)
        .await
        .unwrap();
    assert_eq!(distribution.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_remote_status_is_carried_per_key() {
    let (verifier, _) = remote_verifier(vec![
        Target::expired(
            "ctfe_2021.pub",
            std::fs::read(test_data("ctfe_other.pub")).unwrap(),
        ),
        Target::active(CTFE_TARGET, CTFE_PEM),
    ]);
    let outcome = verifier
        .verify_sct(&FetchContext::background(), LEAF_EMBEDDED, ISSUER, &[])
        .await
        .unwrap();
    assert_eq!(outcome.advisories, Vec::new());
}

#[tokio::test]
async fn test_verify_embedded_sct_chain() {
    let leaf = certificate_from_pem(LEAF_EMBEDDED).unwrap();
    let issuer = certificate_from_pem(ISSUER).unwrap();
    let outcome = override_verifier()
        .verify_embedded_sct(&FetchContext::background(), &[leaf, issuer])
        .await
        .unwrap();
    assert_eq!(outcome.mode, SctMode::Embedded);
}

#[tokio::test]
async fn test_verify_embedded_sct_requires_issuer() {
    let leaf = certificate_from_pem(LEAF_EMBEDDED).unwrap();
    let err = override_verifier()
        .verify_embedded_sct(&FetchContext::background(), &[leaf])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_fulcio_certificate_with_production_log_key() {
    let engine = base64::engine::general_purpose::STANDARD;
    let key_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        key_file.path(),
        engine.decode(FULCIO_CT_KEY_BASE64).unwrap(),
    )
    .unwrap();

    let leaf = parse_certificate(&engine.decode(FULCIO_LEAF_BASE64).unwrap()).unwrap();
    let issuer = legacy_intermediate().unwrap();
    let verifier = SctVerifier::new(TrustSourceResolver::local(key_file.path()));

    let outcome = verifier
        .verify_embedded_sct(&FetchContext::background(), &[leaf.clone(), issuer])
        .await
        .unwrap();
    assert_eq!(outcome.mode, SctMode::Embedded);
    assert_eq!(outcome.verified, 1);

    // The same SCT does not verify against an unrelated issuer
    let wrong_issuer = certificate_from_pem(ISSUER).unwrap();
    let cert_pem = certificates_to_pem(&[leaf.to_der().unwrap().into()]);
    let chain_pem = certificates_to_pem(&[wrong_issuer.to_der().unwrap().into()]);
    let err = verifier
        .verify_sct(
            &FetchContext::background(),
            cert_pem.as_bytes(),
            chain_pem.as_bytes(),
            &[],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Verification);
}
