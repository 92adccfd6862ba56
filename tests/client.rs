use std::time::Duration;

use centauri_chat::api::models::SendRequest;
use centauri_chat::{ApiClient, Contact, Transport, TransportError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn alice() -> Contact {
    Contact::new("Alice", "alice@example.com")
}

#[tokio::test]
async fn fetch_posts_contact_and_decodes_both_lists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/mensagens"))
        .and(body_json(json!({"name": "Alice", "address": "alice@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messagesReceived": [{"content": "hi", "sentAt": "2024-01-01T10:00:00Z"}],
            "messagesSent": [{"content": "yo", "sentAt": "2024-01-01T10:05:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client_for(&server).fetch_messages(&alice()).await.unwrap();
    assert_eq!(resp.received.len(), 1);
    assert_eq!(resp.received[0].content, "hi");
    assert_eq!(resp.sent[0].content, "yo");
}

#[tokio::test]
async fn fetch_accepts_legacy_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/mensagens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mensagensDestinatario": [],
            "mensagensRemetente": [{"conteudo": "ola", "dataEnvio": "2024-05-02T08:30:00"}]
        })))
        .mount(&server)
        .await;

    let resp = client_for(&server).fetch_messages(&alice()).await.unwrap();
    assert!(resp.received.is_empty());
    assert_eq!(resp.sent[0].content, "ola");
}

#[tokio::test]
async fn fetch_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/mensagens"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_messages(&alice()).await.unwrap_err();
    assert!(matches!(err, TransportError::Status(500)));
}

#[tokio::test]
async fn send_posts_recipient_and_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/enviar"))
        .and(body_json(json!({"recipientAddress": "alice@example.com", "content": "yo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("OK")))
        .expect(1)
        .mount(&server)
        .await;

    let request = SendRequest {
        recipient_address: "alice@example.com".into(),
        content: "yo".into(),
    };
    client_for(&server).send_message(&request).await.unwrap();
}

#[tokio::test]
async fn send_rejected_by_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/enviar"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let request = SendRequest {
        recipient_address: "alice@example.com".into(),
        content: "yo".into(),
    };
    let err = client_for(&server).send_message(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Status(403)));
}

#[tokio::test]
async fn send_failure_reported_in_ok_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/enviar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("INTERNAL_SERVER_ERROR")))
        .mount(&server)
        .await;

    let request = SendRequest {
        recipient_address: "alice@example.com".into(),
        content: "yo".into(),
    };
    let err = client_for(&server).send_message(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected(status) if status == "INTERNAL_SERVER_ERROR"));
}

#[tokio::test]
async fn send_with_empty_body_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/enviar"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let request = SendRequest {
        recipient_address: "alice@example.com".into(),
        content: "yo".into(),
    };
    client_for(&server).send_message(&request).await.unwrap();
}

#[tokio::test]
async fn contact_search_and_add() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/destinatario/busca"))
        .and(query_param("email", "alice@example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"nome": "Alice", "endereco": "alice@example.com"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/destinatario/adiciona"))
        .and(query_param("email", "alice@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let found = client.search_contact(" alice@example.com ").await.unwrap();
    assert_eq!(found, [alice()]);
    client.add_contact("alice@example.com").await.unwrap();
}

#[tokio::test]
async fn blank_search_never_hits_the_server() {
    let server = MockServer::start().await;
    let err = client_for(&server).search_contact("  ").await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidArgument(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_redirect_to_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/login?error"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client_for(&server).login("me@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, TransportError::LoginRejected(user) if user == "me@example.com"));
}

#[tokio::test]
async fn login_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client_for(&server).login("me@example.com", "secret").await.unwrap();
}

#[test]
fn rejects_empty_base_url() {
    assert!(matches!(
        ApiClient::new("  ", Duration::from_secs(1)),
        Err(TransportError::Url(_))
    ));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/mensagens"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_messages(&alice()).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}
