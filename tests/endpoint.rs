use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use analogous_edit::EndpointConfig;
use analogous_edit::llm::edit::EDIT_SYSTEM_PROMPT;
use analogous_edit::llm::{build_client, build_edit_prompt, get_edit_with, healthcheck_client};
use serde_json::{Value, json};

struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }
}

/// Accepts a single connection, records the request and answers with `body`.
fn serve_once(status: &str, body: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
    let status = status.to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .map(|(_, value)| value.parse::<usize>().unwrap())
            .unwrap_or(0);
        let mut raw_body = vec![0; content_length];
        reader.read_exact(&mut raw_body).unwrap();

        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(raw_body).unwrap(),
        }
    });

    (base_url, handle)
}

fn chat_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": "local-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
            "logprobs": null
        }]
    })
    .to_string()
}

#[test]
fn sends_fixed_chat_request_and_returns_content_verbatim() {
    let reply = r#"{"reason": "no pattern match", "edit": "dog sat"}"#;
    let (base_url, server) = serve_once("200 OK", chat_completion(reply));

    let edit = get_edit_with(&EndpointConfig::new(base_url), "cat sat", "cat sits", "dog sat")
        .unwrap();
    let request = server.join().unwrap();

    assert_eq!(edit, reply);
    assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("Bearer not-needed"));

    let body = request.json();
    assert_eq!(body["model"], "local-model");
    assert_eq!(body["temperature"].as_f64(), Some(0.1));

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], EDIT_SYSTEM_PROMPT);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(
        messages[1]["content"],
        build_edit_prompt("cat sat", "cat sits", "dog sat")
    );
}

#[test]
fn whitespace_in_reply_is_kept() {
    let reply = "\n  dog **sits**  \n";
    let (base_url, server) = serve_once("200 OK", chat_completion(reply));

    let edit = get_edit_with(&EndpointConfig::new(base_url), "cat sat", "cat sits", "dog sat")
        .unwrap();
    server.join().unwrap();

    assert_eq!(edit, reply);
}

#[test]
fn empty_inputs_are_still_sent() {
    let (base_url, server) = serve_once("200 OK", chat_completion("{}"));

    let edit = get_edit_with(&EndpointConfig::new(base_url), "", "", "").unwrap();
    let request = server.join().unwrap();

    assert_eq!(edit, "{}");
    assert_eq!(
        request.json()["messages"][1]["content"],
        build_edit_prompt("", "", "")
    );
}

#[test]
fn connection_refused_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
    drop(listener);

    let result = get_edit_with(&EndpointConfig::new(base_url), "cat sat", "cat sits", "dog sat");

    assert!(result.is_err());
}

#[test]
fn reply_without_choices_is_an_error() {
    let body = json!({
        "id": "chatcmpl-2",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": "local-model",
        "choices": []
    })
    .to_string();
    let (base_url, server) = serve_once("200 OK", body);

    let err = get_edit_with(&EndpointConfig::new(base_url), "a", "b", "c").unwrap_err();
    server.join().unwrap();

    assert!(format!("{err:?}").contains("No choices returned from model"));
}

#[test]
fn rejected_request_is_an_error() {
    let body = json!({
        "error": {
            "message": "model not loaded",
            "type": "invalid_request_error",
            "param": null,
            "code": null
        }
    })
    .to_string();
    let (base_url, server) = serve_once("400 Bad Request", body);

    let result = get_edit_with(&EndpointConfig::new(base_url), "a", "b", "c");
    server.join().unwrap();

    assert!(result.is_err());
}

#[tokio::test]
async fn healthcheck_lists_served_models() {
    let body = json!({
        "object": "list",
        "data": [
            { "id": "local-model", "object": "model", "created": 0, "owned_by": "organization_owner" },
            { "id": "other-model", "object": "model", "created": 0, "owned_by": "organization_owner" }
        ]
    })
    .to_string();
    let (base_url, server) = serve_once("200 OK", body);

    let client = build_client(&EndpointConfig::new(base_url));
    let models = healthcheck_client(&client).await.unwrap();
    let request = server.join().unwrap();

    assert_eq!(models, vec!["local-model", "other-model"]);
    assert_eq!(request.request_line, "GET /v1/models HTTP/1.1");
}
