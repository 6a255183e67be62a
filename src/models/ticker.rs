//! Ticker model and the request body shared by create and update.

use serde::{Deserialize, Serialize};

use super::BridgeConnection;

/// Contact and social details shown alongside a ticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Information {
    pub author: String,
    pub url: String,
    pub email: String,
    pub twitter: String,
    pub facebook: String,
}

/// A tenant broadcast channel.
///
/// Serializes to the public ticker shape; bridge credentials never leave the
/// process (see [`BridgeConnection`]'s `Serialize` impl).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub id: i64,
    pub creation_date: String,
    pub domain: String,
    pub title: String,
    pub description: String,
    pub active: bool,
    pub prepend_time: bool,
    pub hashtags: Vec<String>,
    pub information: Information,
    #[serde(rename = "twitter")]
    pub bridge: BridgeConnection,
}

impl Ticker {
    /// Overwrite every mutable field with the submitted values.
    ///
    /// The bridge connection is left untouched.
    pub fn apply(&mut self, fields: TickerFields) {
        self.domain = fields.domain;
        self.title = fields.title;
        self.description = fields.description;
        self.active = fields.active;
        self.prepend_time = fields.prepend_time;
        self.hashtags = fields.hashtags;
        self.information = fields.information;
    }

    /// Reinitialize runtime state after the message history was wiped.
    pub fn reset(&mut self) {
        self.active = false;
    }
}

/// Request body for creating or updating a ticker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TickerFields {
    pub domain: String,
    pub title: String,
    pub description: String,
    pub active: bool,
    pub prepend_time: bool,
    pub hashtags: Vec<String>,
    pub information: Information,
}

/// Request body for changing a ticker's bridge connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeRequest {
    pub active: bool,
    pub disconnect: bool,
    pub token: String,
    pub secret: String,
}
