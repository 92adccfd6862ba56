use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response};
use url::Url;

use crate::api::models::{Contact, FetchRequest, FetchResponse, SendRequest};
use crate::app::AppConfig;
use crate::error::TransportError;
use crate::utils::normalize_url;

/// The two calls the sync engine makes against the chat service.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Both lists of the response are individually time ordered.
    async fn fetch_messages(&self, contact: &Contact) -> Result<FetchResponse, TransportError>;

    async fn send_message(&self, request: &SendRequest) -> Result<(), TransportError>;
}

pub struct ApiClient {
    http: HttpClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = normalize_url(base_url);
        Url::parse(&base_url)?;
        let http = HttpClient::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(Url::parse(&format!("{}/{}", self.base_url, path))?)
    }

    fn ensure_success(resp: Response) -> Result<Response, TransportError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }

    /// Form login. The session cookie is kept by the client for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), TransportError> {
        let resp = self
            .http
            .post(self.endpoint("login")?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let resp = Self::ensure_success(resp)?;
        // failed logins redirect back to the login page with an `error` flag
        if resp.url().as_str().contains("error") {
            return Err(TransportError::LoginRejected(username.to_string()));
        }
        log::info!("Logged in to {} as {}", self.base_url, username);
        Ok(())
    }

    /// Looks up a registered user by email. An unknown email yields an empty list.
    pub async fn search_contact(&self, email: &str) -> Result<Vec<Contact>, TransportError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(TransportError::InvalidArgument("email cannot be blank"));
        }
        let mut url = self.endpoint("chat/destinatario/busca")?;
        url.query_pairs_mut().append_pair("email", email);
        let resp = Self::ensure_success(self.http.post(url).send().await?)?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Associates the user registered under `email` as a contact.
    pub async fn add_contact(&self, email: &str) -> Result<(), TransportError> {
        let mut url = self.endpoint("chat/destinatario/adiciona")?;
        url.query_pairs_mut().append_pair("email", email.trim());
        Self::ensure_success(self.http.post(url).send().await?)?;
        Ok(())
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn fetch_messages(&self, contact: &Contact) -> Result<FetchResponse, TransportError> {
        let body = FetchRequest {
            name: &contact.name,
            address: &contact.address,
        };
        let resp = self
            .http
            .post(self.endpoint("chat/mensagens")?)
            .json(&body)
            .send()
            .await?;
        let body = Self::ensure_success(resp)?.text().await?;
        Ok(serde_json::from_str::<FetchResponse>(&body)?)
    }

    async fn send_message(&self, request: &SendRequest) -> Result<(), TransportError> {
        let resp = self
            .http
            .post(self.endpoint("chat/enviar")?)
            .json(request)
            .send()
            .await?;
        let body = Self::ensure_success(resp)?.text().await?;
        check_send_ack(&body)
    }
}

/// The service acknowledges a send with HTTP 200 and a status name in the
/// body, so a failed send still arrives as a 2xx.
fn check_send_ack(body: &str) -> Result<(), TransportError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::String(status) if status != "OK" => {
            Err(TransportError::Rejected(status))
        }
        _ => Ok(()),
    }
}
