use super::*;

#[test]
fn render_signed_out_state() {
    let rendered = render_state(&SyncState::default());
    assert!(rendered["identity"].is_null());
    assert!(rendered["role"].is_null());
    assert!(rendered["profile"].is_null());
    assert_eq!(rendered["is_profile_loading"], false);
    assert!(rendered["last_error"].is_null());
}

#[test]
fn render_signed_in_state_defaults_role() {
    let identity = Identity::new("uid-1", Arc::new(StaticToken("t".into()))).with_email("u@x.com");
    let state = SyncState { identity: Some(identity), ..SyncState::default() };
    let rendered = render_state(&state);
    assert_eq!(rendered["identity"]["uid"], "uid-1");
    assert_eq!(rendered["identity"]["email"], "u@x.com");
    assert_eq!(rendered["role"], "user");
}

#[test]
fn render_never_includes_token() {
    let identity = Identity::new("uid-1", Arc::new(StaticToken("super-secret".into())));
    let state = SyncState { identity: Some(identity), ..SyncState::default() };
    assert!(!render_state(&state).to_string().contains("super-secret"));
}

#[test]
fn parse_lookup_command() {
    let cli = Cli::try_parse_from(["courtside", "lookup", "--email", "u@x.com", "--token", "abc"]).unwrap();
    assert_eq!(cli.wait_secs, 30);
    assert!(matches!(cli.command, Command::Lookup { ref email, ref token } if email == "u@x.com" && token == "abc"));
}

#[test]
fn parse_sign_in_requires_password() {
    let parsed = Cli::try_parse_from(["courtside", "sign-in", "--email", "u@x.com"]);
    // COURTSIDE_PASSWORD may be set in a developer's env; only assert when it is not.
    if std::env::var("COURTSIDE_PASSWORD").is_err() {
        assert!(parsed.is_err());
    }
}

#[tokio::test]
async fn static_token_returns_value() {
    assert_eq!(StaticToken("abc".into()).token().await.unwrap(), "abc");
}
