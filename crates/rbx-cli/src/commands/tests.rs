//! Unit tests for CLI commands.

use super::call::{build_descriptor, parse_key_value, render, AuthArg, CallArgs};
use super::check::describe_cache;
use super::*;
use rbx_client::{ApiResponse, CachedResultType};
use rbx_config::{CacheDirective, CacheSettings};
use rbx_core::{CredentialKind, HttpMethod, ParamValue};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a temporary directory for testing
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test command context in a temporary directory
fn create_test_context(temp_dir: &TempDir) -> CommandContext {
    CommandContext {
        cwd: Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap(),
        output: crate::output::OutputHandler::new(),
        overrides: HashMap::new(),
        config_path: None,
    }
}

fn call_args(base_url: &str, method: HttpMethod, path: &str) -> CallArgs {
    CallArgs {
        method,
        path: path.to_string(),
        base_url: base_url.to_string(),
        group: "users".to_string(),
        name: "userInfo".to_string(),
        query: Vec::new(),
        body: None,
        auth: AuthArg::None,
        timeout_ms: None,
        pages: 1,
        cursor_param: "cursor".to_string(),
        data_only: false,
    }
}

#[test]
fn test_parse_key_value() {
    assert_eq!(
        parse_key_value("keyword=builder man").unwrap(),
        ("keyword".to_string(), "builder man".to_string())
    );
    assert_eq!(
        parse_key_value("filter=a=b").unwrap(),
        ("filter".to_string(), "a=b".to_string())
    );
    assert_eq!(parse_key_value("empty=").unwrap(), ("empty".to_string(), String::new()));
    assert!(parse_key_value("novalue").is_err());
    assert!(parse_key_value("=value").is_err());
}

#[test]
fn test_build_descriptor() {
    let mut args = call_args("https://users.roblox.com", HttpMethod::Post, "/v1/usernames/users");
    args.query = vec![("limit".to_string(), "10".to_string())];
    args.body = Some(r#"{"usernames":["Roblox"]}"#.to_string());
    args.auth = AuthArg::Cookie;

    let descriptor = build_descriptor(&args).unwrap();

    assert_eq!(descriptor.group(), "users");
    assert_eq!(descriptor.name(), "userInfo");
    assert_eq!(descriptor.method(), HttpMethod::Post);
    assert_eq!(descriptor.credential(), Some(CredentialKind::Cookie));
    assert_eq!(descriptor.body(), Some(&json!({ "usernames": ["Roblox"] })));
    assert_eq!(
        descriptor.search().get("limit"),
        Some(&ParamValue::Scalar("10".to_string()))
    );
}

#[test]
fn test_build_descriptor_rejects_bad_input() {
    let mut args = call_args("https://users.roblox.com", HttpMethod::Post, "/v1/x");
    args.body = Some("{not json".to_string());
    assert!(matches!(
        build_descriptor(&args),
        Err(RbxError::ConfigValidation { .. })
    ));

    let args = call_args("not a url", HttpMethod::Get, "/v1/x");
    assert!(build_descriptor(&args).is_err());
}

#[test]
fn test_describe_cache() {
    let mut config = ClientConfig::default();
    assert_eq!(describe_cache(&config, "users", "userInfo"), "users/userInfo: not cached (no rule)");

    config.cache.set_group("*", CacheSettings::new("memory").with_lifetime(Duration::from_secs(20)));
    config.cache.set_endpoint("users", "userInfo", CacheDirective::disabled());
    config.cache.set_endpoint("users", "search", CacheSettings::new("disk"));

    assert_eq!(describe_cache(&config, "users", "userInfo"), "users/userInfo: disabled");
    assert_eq!(
        describe_cache(&config, "users", "search"),
        "users/search: disk adapter, no expiry"
    );
    assert_eq!(
        describe_cache(&config, "groups", "groupInfo"),
        "groups/groupInfo: memory adapter, lifetime 20s"
    );
}

#[test]
fn test_describe_source() {
    let cwd = Utf8PathBuf::from("/work/project");
    assert_eq!(
        describe_source(&ConfigSource::ProjectToml(cwd.join("rbx.toml")), &cwd),
        "rbx.toml"
    );
    assert_eq!(
        describe_source(&ConfigSource::ProjectJson(Utf8PathBuf::from("/work/rbx.json")), &cwd),
        "/work/rbx.json"
    );
    assert_eq!(describe_source(&ConfigSource::Defaults, &cwd), "built-in defaults");
}

#[test]
fn test_render() {
    let page = |n: i64| ApiResponse {
        response: None,
        data: json!(n),
        body: json!({ "value": n }),
        cached_result_type: CachedResultType::Cached,
    };

    assert_eq!(render(&[page(1)], true).unwrap(), json!(1));
    assert_eq!(render(&[page(1), page(2)], true).unwrap(), json!([1, 2]));

    let full = render(&[page(3)], false).unwrap();
    assert_eq!(full["cachedResultType"], json!("cached"));
    assert_eq!(full["body"], json!({ "value": 3 }));
}

#[tokio::test]
async fn test_load_config_layers_flags_over_file() {
    let temp_dir = create_temp_dir();
    fs::write(
        temp_dir.path().join("rbx.toml"),
        "csrf_retries = 3\n\n[credentials]\ncookie = \"from-file\"\n",
    )
    .unwrap();

    let mut ctx = create_test_context(&temp_dir);
    ctx.overrides.insert("csrf-retries".to_string(), "5".to_string());

    let (config, source) = ctx.load_config().await.unwrap();
    assert!(matches!(source, ConfigSource::ProjectToml(_)));
    assert_eq!(config.csrf_retries(), 5);
    assert_eq!(config.credentials.cookie.as_deref(), Some("from-file"));
}

#[tokio::test]
async fn test_load_config_from_explicit_json_file() {
    let temp_dir = create_temp_dir();
    fs::write(temp_dir.path().join("custom.json"), r#"{ "csrf_retries": 4 }"#).unwrap();

    let mut ctx = create_test_context(&temp_dir);
    ctx.config_path = Some(Utf8PathBuf::from("custom.json"));

    let (config, source) = ctx.load_config().await.unwrap();
    assert!(matches!(source, ConfigSource::ProjectJson(_)));
    assert_eq!(config.csrf_retries(), 4);
}

#[tokio::test]
async fn test_check_accepts_valid_config() {
    let temp_dir = create_temp_dir();
    fs::write(
        temp_dir.path().join("rbx.toml"),
        "[cache.\"*\"]\nadapter = \"memory\"\nlifetime_secs = 30\n",
    )
    .unwrap();
    let ctx = create_test_context(&temp_dir);

    let result = check::execute(Some("users".to_string()), Some("userInfo".to_string()), &ctx).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_check_rejects_unknown_adapter() {
    let temp_dir = create_temp_dir();
    fs::write(
        temp_dir.path().join("rbx.toml"),
        "[cache.users]\nadapter = \"redis\"\n",
    )
    .unwrap();
    let ctx = create_test_context(&temp_dir);

    let err = check::execute(None, None, &ctx).await.unwrap_err();
    assert!(matches!(err, RbxError::ConfigValidation { .. }));
    assert!(err.to_string().contains("redis"));
}

#[tokio::test]
async fn test_check_reports_parse_errors_with_path() {
    let temp_dir = create_temp_dir();
    fs::write(temp_dir.path().join("rbx.toml"), "csrf_retries = \"many\"\n").unwrap();
    let ctx = create_test_context(&temp_dir);

    match check::execute(None, None, &ctx).await {
        Err(RbxError::ConfigParse { file, .. }) => assert!(file.ends_with("rbx.toml")),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_call_against_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/1"))
        .and(query_param("detail", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Roblox" })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = create_temp_dir();
    let ctx = create_test_context(&temp_dir);

    let mut args = call_args(&server.uri(), HttpMethod::Get, "/v1/users/1");
    args.query = vec![("detail".to_string(), "full".to_string())];
    args.data_only = true;

    call::execute(args, &ctx).await.unwrap();
}

#[tokio::test]
async fn test_call_surfaces_missing_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = create_temp_dir();
    let ctx = create_test_context(&temp_dir);

    let mut args = call_args(&server.uri(), HttpMethod::Get, "/v1/users/authenticated");
    args.auth = AuthArg::ApiKey;

    let err = call::execute(args, &ctx).await.unwrap_err();
    assert!(matches!(err, RbxError::Auth { attempts: 0, .. }));
}
