use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill_exec::{
    CodeRunner, ExecutionStrategy, Executor, LocalStrategy, NO_OUTPUT, RemoteStrategy, RunError,
    RunOutcome, StrategyError, lookup_language,
};

fn executor_for(server: &MockServer) -> Executor {
    Executor::new(
        Arc::new(RemoteStrategy::new(server.uri())),
        Arc::new(LocalStrategy::new("/no/such/node", Duration::from_millis(100))),
    )
}

#[tokio::test]
async fn test_submission_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(query_param("base64_encoded", "false"))
        .and(query_param("wait", "true"))
        .and(header("X-RapidAPI-Key", "secret"))
        .and(body_json(json!({
            "source_code": "print('hi')",
            "language_id": 71,
            "stdin": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "stdout": "hi\n",
            "stderr": null,
            "compile_output": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RemoteStrategy::new(server.uri()).with_api_key("secret");
    let python = lookup_language("python").unwrap();
    let result = remote.execute("print('hi')", python).await.unwrap();

    assert_eq!(result.get_stdout(), Some("hi\n"));
}

#[tokio::test]
async fn test_stderr_and_compile_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"source_code": "bad", "language_id": 54, "stdin": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stdout": null,
            "stderr": null,
            "compile_output": "main.cpp:1:1: error: 'bad' does not name a type"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_json(json!({"source_code": "raise", "language_id": 71, "stdin": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stdout": "",
            "stderr": "RuntimeError: No active exception to reraise",
            "compile_output": "ignored"
        })))
        .mount(&server)
        .await;

    let executor = executor_for(&server);

    let outcome = executor.execute("cpp", "bad").await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Failed("Compilation Error:\nmain.cpp:1:1: error: 'bad' does not name a type".into())
    );

    let outcome = executor.execute("python", "raise").await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Failed("Error:\nRuntimeError: No active exception to reraise".into())
    );
}

#[tokio::test]
async fn test_empty_result_is_no_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let outcome = executor_for(&server).execute("bash", "true").await.unwrap();
    assert_eq!(outcome, RunOutcome::Succeeded(NO_OUTPUT.into()));
}

#[tokio::test]
async fn test_server_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let remote = RemoteStrategy::new(server.uri());
    let err = remote
        .execute("puts 1", lookup_language("ruby").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StrategyError::Status(429)));

    let outcome = executor_for(&server).execute("ruby", "puts 1").await.unwrap();
    assert!(!outcome.is_success());
    assert!(outcome.output().contains("Compilation service unavailable (HTTP 429)"));
}

#[tokio::test]
async fn test_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let remote = RemoteStrategy::new(server.uri());
    let err = remote
        .execute("SELECT 1;", lookup_language("sql").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StrategyError::Malformed(_)));
}

#[tokio::test]
async fn test_unsupported_language_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stdout": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let runner = CodeRunner::new(executor_for(&server), "cobol", "DISPLAY 'HI'.");
    let err = runner.run().await.unwrap_err();

    match err {
        RunError::Unsupported { language, supported } => {
            assert_eq!(language, "cobol");
            assert_eq!(supported.split(", ").count(), 12);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_javascript_still_settles() {
    // Nothing listens on port 9 locally, and the interpreter path is bogus too:
    // the run must still settle as a displayed failure.
    let executor = Executor::new(
        Arc::new(RemoteStrategy::new("http://127.0.0.1:9")),
        Arc::new(LocalStrategy::new("/no/such/node", Duration::from_millis(100))),
    );
    let runner = CodeRunner::new(executor, "javascript", "console.log(1)");

    let outcome = runner.run().await.unwrap();
    assert!(!outcome.is_success());
    assert!(outcome.output().starts_with("Error:\nFailed to start local interpreter"));
}
