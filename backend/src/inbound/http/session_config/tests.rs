//! Unit tests for session configuration parsing.

use std::collections::HashMap;

use mockable::MockEnv;
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("roasted-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'k'; len]).expect("write temporary key");
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_str().expect("utf-8 temp path").to_owned()
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn release_key() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN)
}

fn release_vars(key: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[rstest]
fn release_accepts_complete_settings(release_key: TempKeyFile) {
    let env = mock_env(release_vars(&release_key));

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl, Duration::from_secs(30 * 24 * 60 * 60));
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_key: TempKeyFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&release_key);
    vars.remove(missing);
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("missing toggle");

    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_rejects_malformed_booleans(release_key: TempKeyFile, #[case] value: &str) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, value.to_owned());
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("malformed toggle");

    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("ephemeral rejected");

    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = TempKeyFile::new(40);
    let env = mock_env(release_vars(&short));

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("short key");

    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort {
            length: 40,
            min_len: SESSION_KEY_MIN_LEN,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_missing_key_file(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(KEY_FILE_ENV, "/nonexistent/roasted/session_key".to_owned());
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("unreadable key");

    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn release_rejects_insecure_same_site_none(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("insecure none");

    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn debug_defaults_use_ephemeral_key() {
    let env = mock_env(HashMap::from([(
        KEY_FILE_ENV,
        "/nonexistent/roasted/session_key".to_owned(),
    )]));

    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_falls_back_on_bad_same_site(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(SAMESITE_ENV, "sideways".to_owned());
    let env = mock_env(vars);

    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("fallback");

    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_rejects_keys_too_short_to_derive() {
    let tiny = TempKeyFile::new(8);
    let env = mock_env(HashMap::from([(KEY_FILE_ENV, tiny.path_str())]));

    let err = session_settings_from_env(&env, BuildMode::Debug)
        .err()
        .expect("tiny key");

    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort {
            min_len: SESSION_KEY_DEBUG_MIN_LEN,
            ..
        }
    ));
}

#[rstest]
#[case("7", 7)]
#[case(" 365 ", 365)]
fn ttl_accepts_day_counts(release_key: TempKeyFile, #[case] raw: &str, #[case] days: u64) {
    let mut vars = release_vars(&release_key);
    vars.insert(TTL_DAYS_ENV, raw.to_owned());
    let env = mock_env(vars);

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("ttl");

    assert_eq!(settings.ttl, Duration::from_secs(days * 86_400));
}

#[rstest]
#[case("0")]
#[case("366")]
#[case("a week")]
fn ttl_rejects_out_of_range_values(release_key: TempKeyFile, #[case] raw: &str) {
    let mut vars = release_vars(&release_key);
    vars.insert(TTL_DAYS_ENV, raw.to_owned());
    let env = mock_env(vars);

    let err = session_settings_from_env(&env, BuildMode::Release)
        .err()
        .expect("bad ttl");

    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: TTL_DAYS_ENV,
            ..
        }
    ));
}

#[test]
fn fingerprints_are_short_hex() {
    let fingerprint = key_fingerprint(&Key::generate());
    assert_eq!(fingerprint.len(), 16);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}
