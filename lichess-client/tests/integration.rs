//! Integration tests for the Lichess client using wiremock.

use futures::StreamExt;
use lichess_auth::{AuthError, AuthToken, MemoryTokenStore, TokenStore};
use lichess_client::{ClientConfig, Lichess, LichessError, Study};
use lichess_ndjson::NdjsonError;
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "lip_testtoken";

fn client(server: &MockServer) -> Lichess {
    Lichess::new(AuthToken::new(TOKEN)).base_url(server.uri())
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        ..ClientConfig::default()
    }
}

fn account_body() -> serde_json::Value {
    serde_json::json!({
        "id": "thibault",
        "username": "Thibault",
        "url": "https://lichess.org/@/Thibault",
        "createdAt": 1290415680000_u64,
        "perfs": {"blitz": {"games": 10, "rating": 1800}}
    })
}

fn ndjson(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/x-ndjson")
}

fn study(id: &str, name: &str) -> Study {
    Study {
        id: id.into(),
        name: name.into(),
    }
}

// ─── Account ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn account_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .expect(1)
        .mount(&server)
        .await;

    let account = client(&server).account().await.expect("should succeed");
    assert_eq!(account.id, "thibault");
    assert_eq!(account.username, "Thibault");
    assert_eq!(account.extra["perfs"]["blitz"]["rating"], 1800);
}

#[tokio::test]
async fn account_sends_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .and(header("user-agent", "study-sync/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .user_agent("study-sync/2.0")
        .account()
        .await
        .expect("should succeed");
}

#[tokio::test]
async fn account_401_maps_to_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("No such token"))
        .mount(&server)
        .await;

    let err = client(&server).account().await.unwrap_err();
    assert!(matches!(err, LichessError::Authentication(ref msg) if msg == "No such token"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_reads_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "60"))
        .mount(&server)
        .await;

    let err = client(&server).account().await.unwrap_err();
    assert!(matches!(
        err,
        LichessError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(60)
    ));
}

#[tokio::test]
async fn invalid_json_maps_to_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).account().await.unwrap_err();
    assert!(matches!(err, LichessError::Decode(_)));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(account_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .timeout(Some(Duration::from_millis(50)))
        .account()
        .await
        .unwrap_err();
    assert!(matches!(err, LichessError::Timeout(_)), "got: {err:?}");
    assert!(err.is_retryable());
}

// ─── Studies ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn studies_by_parses_ndjson() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/thibault"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .and(header("accept", "application/x-ndjson"))
        .respond_with(ndjson(concat!(
            "{\"id\":\"aaaa1111\",\"name\":\"Najdorf\",\"createdAt\":1}\n",
            "{\"id\":\"bbbb2222\",\"name\":\"Caro-Kann ♟\",\"createdAt\":2}\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let studies = client(&server).studies_by("thibault").await.unwrap();
    assert_eq!(
        studies,
        vec![study("aaaa1111", "Najdorf"), study("bbbb2222", "Caro-Kann ♟")]
    );
}

#[tokio::test]
async fn studies_by_handles_crlf_blank_lines_and_no_trailing_newline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/thibault"))
        .respond_with(ndjson(
            "{\"id\":\"a\",\"name\":\"One\"}\r\n\r\n{\"id\":\"b\",\"name\":\"Two\"}",
        ))
        .mount(&server)
        .await;

    let studies = client(&server).studies_by("thibault").await.unwrap();
    assert_eq!(studies, vec![study("a", "One"), study("b", "Two")]);
}

#[tokio::test]
async fn studies_by_empty_body_is_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/nobody"))
        .respond_with(ndjson(""))
        .mount(&server)
        .await;

    assert!(client(&server).studies_by("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn study_stream_yields_records_then_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/thibault"))
        .respond_with(ndjson("{\"id\":\"a\",\"name\":\"One\"}\n{\"id\":\n"))
        .mount(&server)
        .await;

    let stream = client(&server).study_stream("thibault").await.unwrap();
    let items: Vec<_> = stream.collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &study("a", "One"));
    assert!(matches!(
        items[1],
        Err(LichessError::Stream(NdjsonError::Json { line: 2, .. }))
    ));
}

#[tokio::test]
async fn studies_by_rejects_records_without_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/thibault"))
        .respond_with(ndjson("{\"id\":\"a\"}\n"))
        .mount(&server)
        .await;

    let err = client(&server).studies_by("thibault").await.unwrap_err();
    assert!(matches!(err, LichessError::Stream(NdjsonError::Json { line: 1, .. })));
}

#[tokio::test]
async fn studies_by_unknown_user_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/study/by/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let err = client(&server).studies_by("ghost").await.unwrap_err();
    assert!(matches!(err, LichessError::NotFound(_)));
}

// ─── Broadcasts ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn my_broadcast_rounds_extracts_round() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broadcast/my-rounds"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .respond_with(ndjson(concat!(
            "{\"tour\":{\"id\":\"t1\",\"name\":\"Club champs\"},",
            "\"round\":{\"id\":\"r1\",\"name\":\"Round 1\"},",
            "\"study\":{\"writeable\":true}}\n",
            "{\"tour\":{\"id\":\"t1\",\"name\":\"Club champs\"},",
            "\"round\":{\"id\":\"r2\",\"name\":\"Round 2\"},",
            "\"study\":{\"writeable\":true}}\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let rounds = client(&server).my_broadcast_rounds().await.unwrap();
    assert_eq!(rounds, vec![study("r1", "Round 1"), study("r2", "Round 2")]);
}

#[tokio::test]
async fn broadcast_round_stream_is_incremental() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broadcast/my-rounds"))
        .respond_with(ndjson(concat!(
            "{\"round\":{\"id\":\"r1\",\"name\":\"Round 1\"}}\n",
            "{\"round\":{\"id\":\"r2\",\"name\":\"Round 2\"}}\n",
        )))
        .mount(&server)
        .await;

    let stream = client(&server).broadcast_round_stream().await.unwrap();
    let mut stream = std::pin::pin!(stream);
    let first = stream.next().await.expect("one round").unwrap();
    assert_eq!(first, study("r1", "Round 1"));
    let second = stream.next().await.expect("two rounds").unwrap();
    assert_eq!(second, study("r2", "Round 2"));
    assert!(stream.next().await.is_none());
}

// ─── PGN import / push ───────────────────────────────────────────────────────

#[tokio::test]
async fn import_pgn_posts_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/import"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("pgn=1.+e4+e5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "R6iLjwz5",
            "url": "https://lichess.org/R6iLjwz5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let game = client(&server).import_pgn("1. e4 e5").await.unwrap();
    assert_eq!(game.id, "R6iLjwz5");
    assert_eq!(game.url.as_deref(), Some("https://lichess.org/R6iLjwz5"));
}

#[tokio::test]
async fn import_pgn_bad_request_keeps_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/import"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("{\"error\":\"Invalid PGN\"}"),
        )
        .mount(&server)
        .await;

    let err = client(&server).import_pgn("garbage").await.unwrap_err();
    assert!(matches!(
        err,
        LichessError::Http { status: 400, ref body } if body.contains("Invalid PGN")
    ));
}

#[tokio::test]
async fn import_pgn_to_study_posts_pgn_and_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/study/abcd1234/import-pgn"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .and(body_string_contains("pgn=1.+d4"))
        .and(body_string_contains("name=Queen%27s+Gambit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"chapters": []})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .import_pgn_to_study("abcd1234", "1. d4", "Queen's Gambit")
        .await
        .unwrap();
}

#[tokio::test]
async fn import_pgn_to_foreign_study_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/study/abcd1234/import-pgn"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing scope study:write"))
        .mount(&server)
        .await;

    let err = client(&server)
        .import_pgn_to_study("abcd1234", "1. d4", "Ch 1")
        .await
        .unwrap_err();
    assert!(matches!(err, LichessError::Forbidden(_)));
}

#[tokio::test]
async fn push_round_posts_raw_pgn() {
    let server = MockServer::start().await;
    let pgn = "[White \"A\"]\n[Black \"B\"]\n\n1. e4 *\n";

    Mock::given(method("POST"))
        .and(path("/api/broadcast/round/r0und123/push"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .and(header("content-type", "text/plain"))
        .and(body_string(pgn))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"games": []})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).push_round("r0und123", pgn).await.unwrap();
}

#[tokio::test]
async fn push_round_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/broadcast/round/r0und123/push"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server).push_round("r0und123", "1. e4 *").await.unwrap_err();
    assert!(matches!(err, LichessError::ServiceUnavailable(ref msg) if msg == "maintenance"));
    assert!(err.is_retryable());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_validates_then_stores() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .and(header("authorization", "Bearer lip_testtoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let session = lichess_client::sign_in(&store, AuthToken::new(TOKEN), &config(&server))
        .await
        .unwrap();
    assert_eq!(session.username, "Thibault");
    let stored = store.load().await.unwrap().expect("token stored");
    stored.with_secret(|t| assert_eq!(t, TOKEN));
}

#[tokio::test]
async fn sign_in_with_rejected_token_stores_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("No such token"))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    let err = lichess_client::sign_in(&store, AuthToken::new("lip_revoked"), &config(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, LichessError::Authentication(_)));
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn resume_without_stored_token_is_none() {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::new();
    let session = lichess_client::resume(&store, &config(&server)).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn resume_with_valid_token_restores_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token(AuthToken::new(TOKEN));
    let session = lichess_client::resume(&store, &config(&server))
        .await
        .unwrap()
        .expect("session restored");
    assert_eq!(session.username, "Thibault");

    let me = session.client(&config(&server)).account().await.unwrap();
    assert_eq!(me.id, "thibault");
}

#[tokio::test]
async fn resume_clears_revoked_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token(AuthToken::new("lip_revoked"));
    assert!(lichess_client::resume(&store, &config(&server)).await.unwrap().is_none());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn resume_clears_expired_token_without_calling_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_body()))
        .expect(0)
        .mount(&server)
        .await;

    let expired = AuthToken::expiring(TOKEN, std::time::SystemTime::now() - Duration::from_secs(1));
    let store = MemoryTokenStore::with_token(expired);
    assert!(lichess_client::resume(&store, &config(&server)).await.unwrap().is_none());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn resume_keeps_token_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let store = MemoryTokenStore::with_token(AuthToken::new(TOKEN));
    let err = lichess_client::resume(&store, &config(&server)).await.unwrap_err();
    assert!(matches!(err, LichessError::ServiceUnavailable(_)));
    assert!(store.load().await.unwrap().is_some());
}

#[tokio::test]
async fn sign_out_clears_store() {
    let store = MemoryTokenStore::with_token(AuthToken::new(TOKEN));
    lichess_client::sign_out(&store).await.unwrap();
    assert!(store.load().await.unwrap().is_none());
}

/// Serves a fixed token and refuses writes, like an environment variable.
struct FixedTokenStore(AuthToken);

#[async_trait::async_trait]
impl TokenStore for FixedTokenStore {
    async fn load(&self) -> Result<Option<AuthToken>, AuthError> {
        Ok(Some(self.0.clone()))
    }

    async fn store(&self, _token: AuthToken) -> Result<(), AuthError> {
        Err(AuthError::ReadOnly("fixed".into()))
    }

    async fn clear(&self) -> Result<(), AuthError> {
        Err(AuthError::ReadOnly("fixed".into()))
    }
}

#[tokio::test]
async fn resume_with_read_only_store_returns_none_for_revoked_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&server)
        .await;

    let store = FixedTokenStore(AuthToken::new("lip_revoked"));
    assert!(lichess_client::resume(&store, &config(&server)).await.unwrap().is_none());
}

#[tokio::test]
async fn sign_out_of_read_only_store_is_an_error() {
    let store = FixedTokenStore(AuthToken::new(TOKEN));
    let err = lichess_client::sign_out(&store).await.unwrap_err();
    assert!(matches!(err, LichessError::Auth(AuthError::ReadOnly(_))));
}
