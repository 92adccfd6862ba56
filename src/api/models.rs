use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::chat::message::{Direction, Message};
use crate::utils::parse_timestamp;

/// A remote party. `address` keys all conversation state, `name` is display only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "endereco")]
    pub address: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Message as the service returns it; the direction comes from the list it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(alias = "conteudo")]
    pub content: String,
    #[serde(rename = "sentAt", alias = "dataEnvio", deserialize_with = "de_timestamp")]
    pub sent_at: DateTime<Utc>,
}

impl WireMessage {
    pub fn into_message(self, direction: Direction) -> Message {
        Message::new(self.content, self.sent_at, direction)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest<'a> {
    pub name: &'a str,
    pub address: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(
        rename = "messagesReceived",
        alias = "mensagensDestinatario",
        default,
        deserialize_with = "de_list"
    )]
    pub received: Vec<WireMessage>,
    #[serde(
        rename = "messagesSent",
        alias = "mensagensRemetente",
        default,
        deserialize_with = "de_list"
    )]
    pub sent: Vec<WireMessage>,
}

impl FetchResponse {
    /// Splits into (received, sent) batches with direction attached.
    pub fn into_batches(self) -> (Vec<Message>, Vec<Message>) {
        let received = self
            .received
            .into_iter()
            .map(|m| m.into_message(Direction::Received))
            .collect();
        let sent = self
            .sent
            .into_iter()
            .map(|m| m.into_message(Direction::Sent))
            .collect();
        (received, sent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(rename = "recipientAddress")]
    pub recipient_address: String,
    pub content: String,
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn de_list<'de, D>(deserializer: D) -> Result<Vec<WireMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<WireMessage>>::deserialize(deserializer)?.unwrap_or_default())
}
