//! Bridge connection state embedded in a ticker.

use serde::{Deserialize, Serialize, Serializer};

/// Access token pair of the linked external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub secret: String,
}

/// Cached description of the linked external account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteAccount {
    pub name: String,
    pub screen_name: String,
    pub description: String,
    pub image_url: String,
}

/// External account link of a ticker.
///
/// A complete token/secret pair lives in `Inactive` or `Connected`, and the
/// cached account only next to a complete pair. `Configured` holds whatever
/// was submitted while the pair is still incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BridgeConnection {
    #[default]
    Disconnected,
    /// Incomplete credentials; nothing can be looked up yet.
    Configured {
        token: String,
        secret: String,
        active: bool,
    },
    /// Credentials stored, publishing switched off.
    Inactive {
        credentials: Credentials,
        account: Option<RemoteAccount>,
    },
    Connected {
        credentials: Credentials,
        account: Option<RemoteAccount>,
    },
}

impl BridgeConnection {
    /// Rebuild the state from its stored columns.
    pub fn from_parts(
        token: String,
        secret: String,
        active: bool,
        account: Option<RemoteAccount>,
    ) -> Self {
        match (token.is_empty(), secret.is_empty()) {
            (true, true) if !active => BridgeConnection::Disconnected,
            (false, false) => {
                let credentials = Credentials { token, secret };
                if active {
                    BridgeConnection::Connected {
                        credentials,
                        account,
                    }
                } else {
                    BridgeConnection::Inactive {
                        credentials,
                        account,
                    }
                }
            }
            _ => BridgeConnection::Configured {
                token,
                secret,
                active,
            },
        }
    }

    /// Drop credentials, active flag and cached account in one step.
    pub fn disconnect(&mut self) {
        *self = BridgeConnection::Disconnected;
    }

    /// Merge submitted credentials into the current ones and set the active flag.
    ///
    /// Empty values keep the stored credential. The active flag always takes
    /// the submitted value.
    pub fn configure(&mut self, token: &str, secret: &str, active: bool) {
        let (mut next_token, mut next_secret, account) = match std::mem::take(self) {
            BridgeConnection::Disconnected => (String::new(), String::new(), None),
            BridgeConnection::Configured { token, secret, .. } => (token, secret, None),
            BridgeConnection::Inactive {
                credentials,
                account,
            }
            | BridgeConnection::Connected {
                credentials,
                account,
            } => (credentials.token, credentials.secret, account),
        };

        if !token.is_empty() {
            next_token = token.to_string();
        }
        if !secret.is_empty() {
            next_secret = secret.to_string();
        }

        *self = Self::from_parts(next_token, next_secret, active, account);
    }

    /// Replace the cached account. Ignored unless connected.
    pub fn record_account(&mut self, remote: RemoteAccount) -> bool {
        match self {
            BridgeConnection::Connected { account, .. } => {
                *account = Some(remote);
                true
            }
            _ => false,
        }
    }

    /// The complete credential pair, if there is one.
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            BridgeConnection::Disconnected | BridgeConnection::Configured { .. } => None,
            BridgeConnection::Inactive { credentials, .. }
            | BridgeConnection::Connected { credentials, .. } => Some(credentials),
        }
    }

    pub fn account(&self) -> Option<&RemoteAccount> {
        match self {
            BridgeConnection::Disconnected | BridgeConnection::Configured { .. } => None,
            BridgeConnection::Inactive { account, .. }
            | BridgeConnection::Connected { account, .. } => account.as_ref(),
        }
    }

    /// The stored active flag.
    pub fn is_active(&self) -> bool {
        match self {
            BridgeConnection::Connected { .. } => true,
            BridgeConnection::Configured { active, .. } => *active,
            BridgeConnection::Disconnected | BridgeConnection::Inactive { .. } => false,
        }
    }

    /// Complete credentials and switched on; the remote account can be fetched.
    pub fn is_connected(&self) -> bool {
        matches!(self, BridgeConnection::Connected { .. })
    }

    pub fn token(&self) -> &str {
        match self {
            BridgeConnection::Configured { token, .. } => token.as_str(),
            _ => self.credentials().map(|c| c.token.as_str()).unwrap_or(""),
        }
    }

    pub fn secret(&self) -> &str {
        match self {
            BridgeConnection::Configured { secret, .. } => secret.as_str(),
            _ => self.credentials().map(|c| c.secret.as_str()).unwrap_or(""),
        }
    }
}

/// Public view of a connection; never includes the credentials.
#[derive(Serialize)]
struct BridgeView<'a> {
    active: bool,
    connected: bool,
    name: &'a str,
    screen_name: &'a str,
    description: &'a str,
    image_url: &'a str,
}

impl Serialize for BridgeConnection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let account = self.account();
        BridgeView {
            active: self.is_active(),
            connected: self.credentials().is_some(),
            name: account.map(|a| a.name.as_str()).unwrap_or(""),
            screen_name: account.map(|a| a.screen_name.as_str()).unwrap_or(""),
            description: account.map(|a| a.description.as_str()).unwrap_or(""),
            image_url: account.map(|a| a.image_url.as_str()).unwrap_or(""),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> RemoteAccount {
        RemoteAccount {
            name: name.into(),
            screen_name: "systemli".into(),
            ..Default::default()
        }
    }

    fn connected() -> BridgeConnection {
        BridgeConnection::Connected {
            credentials: Credentials {
                token: "token".into(),
                secret: "secret".into(),
            },
            account: Some(account("systemli.org")),
        }
    }

    #[test]
    fn test_disconnect_clears_everything() {
        let mut conn = connected();
        conn.disconnect();
        assert_eq!(conn, BridgeConnection::Disconnected);
        assert_eq!(conn.token(), "");
        assert_eq!(conn.secret(), "");
        assert!(!conn.is_active());
        assert!(conn.account().is_none());
    }

    #[test]
    fn test_configure_token_then_secret() {
        let mut conn = BridgeConnection::Disconnected;
        conn.configure("token", "", false);
        assert_eq!(conn.token(), "token");
        assert_eq!(conn.secret(), "");
        assert!(conn.credentials().is_none());
        assert!(!conn.is_connected());

        conn.configure("", "secret", true);
        assert_eq!(conn.token(), "token");
        assert_eq!(conn.secret(), "secret");
        assert!(conn.is_active());
        assert!(conn.is_connected());
    }

    #[test]
    fn test_configure_sets_active_without_credentials() {
        let mut conn = BridgeConnection::Disconnected;
        conn.configure("", "", true);
        assert!(conn.is_active());
        assert!(!conn.is_connected());
        assert!(conn.credentials().is_none());

        let value = serde_json::to_value(&conn).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["connected"], false);

        conn.configure("", "", false);
        assert_eq!(conn, BridgeConnection::Disconnected);
    }

    #[test]
    fn test_disconnect_clears_partial_credentials() {
        let mut conn = BridgeConnection::Disconnected;
        conn.configure("token", "", true);
        conn.disconnect();
        assert_eq!(conn, BridgeConnection::Disconnected);
        assert_eq!(conn.token(), "");
        assert!(!conn.is_active());
    }

    #[test]
    fn test_configure_with_empty_values_keeps_credentials() {
        let mut conn = connected();
        conn.configure("", "", false);
        assert!(matches!(conn, BridgeConnection::Inactive { .. }));
        assert_eq!(conn.token(), "token");
        assert_eq!(conn.secret(), "secret");
        // Cached account survives toggling the active flag.
        assert_eq!(conn.account().unwrap().name, "systemli.org");

        conn.configure("", "new-secret", true);
        assert!(conn.is_active());
        assert_eq!(conn.secret(), "new-secret");
    }

    #[test]
    fn test_record_account_only_when_connected() {
        let mut conn = BridgeConnection::Disconnected;
        assert!(!conn.record_account(account("nobody")));

        let mut conn2 = connected();
        assert!(conn2.record_account(account("fresh")));
        assert_eq!(conn2.account().unwrap().name, "fresh");

        conn.configure("t", "s", false);
        assert!(!conn.record_account(account("nobody")));
        assert!(conn.account().is_none());
    }

    #[test]
    fn test_serialize_hides_credentials() {
        let value = serde_json::to_value(connected()).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["connected"], true);
        assert_eq!(value["name"], "systemli.org");
        assert!(value.get("token").is_none());
        assert!(value.get("secret").is_none());
    }
}
