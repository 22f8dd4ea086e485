use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use openai_api::{
    ChatCompletionMessage, ChatCompletionRequest, OpenAiApiClient, OpenAiApiConfig, OpenAiApiError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Clone)]
enum ScriptedResponse {
    Respond { status: u16, body: String },
    Reset,
}

struct ScriptedServer {
    base_url: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let scripts = Arc::new(scripts);
        let request_count = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener
            .local_addr()
            .expect("resolved local listener address");
        let base_url = format!("http://{addr}/v1");

        let handle = tokio::spawn({
            let scripts = Arc::clone(&scripts);
            let request_count = Arc::clone(&request_count);
            let requests = Arc::clone(&requests);

            async move {
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    let scripts = Arc::clone(&scripts);
                    let request_count = Arc::clone(&request_count);
                    let requests = Arc::clone(&requests);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, request_count, requests).await;
                    });
                }
            }
        });

        Self {
            base_url,
            request_count,
            requests,
            handle,
        }
    }

    fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Acquire)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn shutdown(&self) {
        self.handle.abort();
    }
}

fn respond(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse::Respond {
        status,
        body: body.to_string(),
    }
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
    })
    .to_string()
}

fn client_for(server: &ScriptedServer) -> OpenAiApiClient {
    let config = OpenAiApiConfig::new("sk-test")
        .with_base_url(&server.base_url)
        .with_retry_base_delay_ms(1);
    OpenAiApiClient::new(config).expect("client")
}

fn request() -> ChatCompletionRequest {
    ChatCompletionRequest::new("gpt-4o-mini", vec![ChatCompletionMessage::new("user", "hi")])
}

#[tokio::test]
async fn complete_decodes_first_choice() {
    let server = ScriptedServer::new(vec![respond(200, &completion_body("  hello there \n"))]).await;
    let client = client_for(&server);

    let response = client.complete(&request()).await.expect("completion");

    assert_eq!(response.first_text(), Some("  hello there \n"));
    assert_eq!(response.usage.map(|usage| usage.total_tokens), Some(5));
    assert_eq!(server.request_count(), 1);

    let raw = server.requests().pop().expect("captured request");
    assert!(raw.starts_with("POST /v1/chat/completions HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert!(raw.contains(r#""content":"hi""#));

    server.shutdown();
}

#[tokio::test]
async fn complete_retries_server_errors_then_succeeds() {
    let server = ScriptedServer::new(vec![
        respond(503, r#"{"error":{"message":"overloaded","type":"server_error"}}"#),
        respond(500, ""),
        respond(200, &completion_body("recovered")),
    ])
    .await;
    let client = client_for(&server);

    let response = client.complete(&request()).await.expect("completion");

    assert_eq!(response.first_text(), Some("recovered"));
    assert_eq!(server.request_count(), 3);
    server.shutdown();
}

#[tokio::test]
async fn complete_does_not_retry_client_errors() {
    let server = ScriptedServer::new(vec![respond(
        401,
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#,
    )])
    .await;
    let client = client_for(&server);

    let error = client.complete(&request()).await.expect_err("401");

    match error {
        OpenAiApiError::Status(status, message) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Incorrect API key provided (invalid_api_key)");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn complete_does_not_retry_quota_exhaustion() {
    let server = ScriptedServer::new(vec![respond(
        429,
        r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#,
    )])
    .await;
    let client = client_for(&server);

    let error = client.complete(&request()).await.expect_err("quota");

    assert_eq!(error.status().map(|status| status.as_u16()), Some(429));
    assert_eq!(server.request_count(), 1);
    server.shutdown();
}

#[tokio::test]
async fn complete_gives_up_after_max_retries() {
    let server = ScriptedServer::new(vec![
        respond(502, ""),
        respond(502, ""),
        respond(502, ""),
        respond(502, ""),
        respond(200, &completion_body("too late")),
    ])
    .await;
    let client = client_for(&server);

    let error = client.complete(&request()).await.expect_err("exhausted");

    assert!(matches!(error, OpenAiApiError::Status(status, _) if status.as_u16() == 502));
    assert_eq!(server.request_count(), 4);
    server.shutdown();
}

#[tokio::test]
async fn complete_retries_dropped_connections() {
    let server = ScriptedServer::new(vec![
        ScriptedResponse::Reset,
        respond(200, &completion_body("after reset")),
    ])
    .await;
    let client = client_for(&server);

    let response = client.complete(&request()).await.expect("completion");

    assert_eq!(response.first_text(), Some("after reset"));
    assert_eq!(server.request_count(), 2);
    server.shutdown();
}

#[tokio::test]
async fn complete_rejects_empty_choices() {
    let server = ScriptedServer::new(vec![respond(200, r#"{"id":"x","choices":[]}"#)]).await;
    let client = client_for(&server);

    let error = client.complete(&request()).await.expect_err("empty");

    assert!(matches!(error, OpenAiApiError::EmptyResponse));
    server.shutdown();
}

#[tokio::test]
async fn complete_reports_malformed_body() {
    let server = ScriptedServer::new(vec![respond(200, "not json")]).await;
    let client = client_for(&server);

    let error = client.complete(&request()).await.expect_err("malformed");

    assert!(matches!(error, OpenAiApiError::Serde(_)));
    server.shutdown();
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<ScriptedResponse>>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let Ok(raw) = read_request(&mut socket).await else {
        return;
    };

    let index = request_count.fetch_add(1, Ordering::AcqRel);
    requests.lock().expect("requests lock").push(raw);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| respond(500, r#"{"error":{"message":"unexpected request"}}"#));

    match response {
        ScriptedResponse::Reset => {}
        ScriptedResponse::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                status_reason(status),
                body.len(),
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 4096];

    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buffer[..n]);

        let Some(header_end) = request
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
        else {
            continue;
        };
        let head = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if request.len() >= header_end + 4 + content_length {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&request).into_owned())
}

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
