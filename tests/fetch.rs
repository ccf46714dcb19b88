//! End to end runs of config requests against a mock HTTP server.

use std::path::Path;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yapi::execute::fetch;
use yapi::http_request_executor::{ExecutionContext, SaveFailurePolicy};
use yapi::session_jar::SessionJar;
use yapi::{YamlConfig, YapiError};

/// A mock server driven from synchronous test code.
struct TestServer {
    server: MockServer,
    rt: Runtime,
}

impl TestServer {
    fn start() -> TestServer {
        let rt = Runtime::new().expect("failed to start runtime");
        let server = rt.block_on(MockServer::start());
        TestServer { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn uri(&self) -> String {
        self.server.uri()
    }

    fn received(&self) -> Vec<wiremock::Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

fn config(source: String) -> YamlConfig {
    YamlConfig::from_source(Path::new("test.yapi.yml"), source).expect("config should parse")
}

fn in_memory_context() -> ExecutionContext {
    ExecutionContext::with_jar(SessionJar::in_memory(), SaveFailurePolicy::BestEffort).unwrap()
}

fn run(cfg: &YamlConfig, name: &str, ctx: &ExecutionContext) -> Result<String, YapiError> {
    let mut out = Vec::new();
    fetch(cfg, name, ctx, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn get_user_prints_status_and_pretty_body() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"id":7,"name":"ann"}"#, "application/json"),
            )
            .expect(1),
    );

    let cfg = config(format!("root: {}\ngetUser:\n  path: /user\n", server.uri()));
    let out = run(&cfg, "getUser", &in_memory_context()).unwrap();

    assert_eq!(out, "200 OK\n\n{\n  \"id\": 7,\n  \"name\": \"ann\"\n}\n");
}

#[test]
fn method_params_headers_and_body_are_sent() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(query_param("page", "2"))
            .and(header("x-token", "request"))
            .and(header("accept", "text/plain"))
            .and(body_string("hello"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1),
    );

    let cfg = config(format!(
        "root: {}\n\
         headers:\n  X-Token: shared\n  Accept: text/plain\n\
         search:\n  path: /search\n  method: POST\n  headers:\n    X-Token: request\n  \
         params:\n    q: rust\n    page: '2'\n  body: hello\n",
        server.uri()
    ));
    let out = run(&cfg, "search", &in_memory_context()).unwrap();

    assert_eq!(out, "201 Created\n\ncreated\n");
}

#[test]
fn requests_without_body_send_no_content_length() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong")),
    );

    let cfg = config(format!("root: {}\nping:\n  path: /ping\n", server.uri()));
    run(&cfg, "ping", &in_memory_context()).unwrap();

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get(&wiremock::http::HeaderName::from("content-length")).is_none());
    assert!(received[0].body.is_empty());
}

#[test]
fn headers_are_displayed_when_configured() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-trace", "abc")
                    .set_body_string("pong"),
            ),
    );

    let cfg = config(format!(
        "root: {}\noutput:\n  headers: true\nping:\n  path: /ping\n",
        server.uri()
    ));
    let out = run(&cfg, "ping", &in_memory_context()).unwrap();

    assert!(out.starts_with("200 OK\n\n"));
    assert!(out.contains("X-Trace: abc\n"));
    assert!(out.ends_with("\n\npong\n"));
}

#[test]
fn redirects_are_not_followed() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new")),
    );
    server.mount(
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );

    let cfg = config(format!("root: {}\nold:\n  path: /old\n", server.uri()));
    let out = run(&cfg, "old", &in_memory_context()).unwrap();

    assert!(out.starts_with("302 Found\n"));
    assert_eq!(server.received().len(), 1);
}

#[test]
fn unknown_request_fails_before_sending() {
    let server = TestServer::start();
    let cfg = config(format!("root: {}\nping:\n  path: /ping\n", server.uri()));

    let err = run(&cfg, "pong", &in_memory_context()).unwrap_err();

    assert!(matches!(err, YapiError::NotFound(_)));
    assert!(server.received().is_empty());
}

#[test]
fn malformed_json_response_is_an_error() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{nope", "application/json")),
    );

    let cfg = config(format!("root: {}\nbroken:\n  path: /broken\n", server.uri()));
    let err = run(&cfg, "broken", &in_memory_context()).unwrap_err();

    assert!(matches!(err, YapiError::Parse { .. }));
}

#[test]
fn session_cookies_carry_over_between_runs() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(204).insert_header("set-cookie", "token=abc; Path=/"),
            ),
    );
    server.mount(
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("cookie", "token=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("it's you"))
            .expect(1),
    );

    let cfg = config(format!(
        "root: {}\nsession: dev\nlogin:\n  path: /login\n  method: POST\nme:\n  path: /me\n",
        server.uri()
    ));
    let dir = TempDir::new().unwrap();
    let jar_path = dir.path().join("yapi").join("dev.jar.json");

    let first = ExecutionContext::with_jar(
        SessionJar::open("dev", jar_path.clone()),
        SaveFailurePolicy::FailFast,
    )
    .unwrap();
    run(&cfg, "login", &first).unwrap();
    drop(first);
    assert!(jar_path.is_file());

    let second = ExecutionContext::with_jar(
        SessionJar::open("dev", jar_path),
        SaveFailurePolicy::FailFast,
    )
    .unwrap();
    let out = run(&cfg, "me", &second).unwrap();

    assert_eq!(out, "200 OK\n\nit's you\n");
}

#[test]
fn jar_save_failure_follows_policy() {
    let server = TestServer::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong")),
    );
    let cfg = config(format!("root: {}\nping:\n  path: /ping\n", server.uri()));

    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let jar_path = blocker.join("dev.jar.json");

    let lenient = ExecutionContext::with_jar(
        SessionJar::open("dev", jar_path.clone()),
        SaveFailurePolicy::BestEffort,
    )
    .unwrap();
    assert_eq!(run(&cfg, "ping", &lenient).unwrap(), "200 OK\n\npong\n");

    let strict = ExecutionContext::with_jar(
        SessionJar::open("dev", jar_path),
        SaveFailurePolicy::FailFast,
    )
    .unwrap();
    let err = run(&cfg, "ping", &strict).unwrap_err();
    assert!(matches!(err, YapiError::Session { .. }));
}
