//! Ticker lifecycle: create, update, bridge changes, reset and delete.
//!
//! Every operation takes the resolved caller and consults the guard itself.
//! The order of the permission and existence checks differs per operation
//! and is part of the observable API (403 vs 404).

mod validation;

use validation::validate_ticker;

use std::sync::Arc;

use crate::bridge::{self, Bridge};
use crate::db::Repository;
use crate::errors::AppError;
use crate::guard;
use crate::models::{BridgeRequest, Ticker, TickerFields, User};

/// Owns every mutation of a ticker.
pub struct TickerManager {
    repo: Arc<Repository>,
    bridge: Arc<dyn Bridge>,
}

impl TickerManager {
    pub fn new(repo: Arc<Repository>, bridge: Arc<dyn Bridge>) -> Self {
        Self { repo, bridge }
    }

    async fn find(&self, id: i64) -> Result<Ticker, AppError> {
        self.repo
            .get_ticker(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticker {} not found", id)))
    }

    /// Tickers visible to the caller, newest first.
    pub async fn list(&self, caller: &User) -> Result<Vec<Ticker>, AppError> {
        if caller.is_super_admin {
            self.repo.list_tickers().await
        } else {
            self.repo.list_tickers_by_ids(&caller.tickers).await
        }
    }

    /// Permission first, then existence.
    pub async fn get(&self, caller: &User, id: i64) -> Result<Ticker, AppError> {
        self.authorized_ticker(caller, id).await
    }

    /// Admin only. The store assigns the ID; the bridge starts disconnected.
    pub async fn create(&self, caller: &User, fields: TickerFields) -> Result<Ticker, AppError> {
        guard::require_admin(caller).check()?;
        validate_ticker(&fields)?;

        let ticker = self.repo.insert_ticker(&fields).await?;
        tracing::info!(ticker_id = ticker.id, domain = %ticker.domain, "Ticker created");
        Ok(ticker)
    }

    /// Permission first, then existence.
    pub async fn authorized_ticker(&self, caller: &User, id: i64) -> Result<Ticker, AppError> {
        guard::authorize(caller, id).check()?;
        self.find(id).await
    }

    /// Validate and store new field values on a ticker from
    /// [`Self::authorized_ticker`].
    pub async fn apply_update(
        &self,
        mut ticker: Ticker,
        fields: TickerFields,
    ) -> Result<Ticker, AppError> {
        validate_ticker(&fields)?;

        ticker.apply(fields);
        self.repo.save_ticker(&ticker).await?;
        Ok(ticker)
    }

    /// Change the bridge connection of a ticker from [`Self::authorized_ticker`].
    /// Bridge lookup failures are not errors.
    pub async fn apply_bridge(
        &self,
        mut ticker: Ticker,
        request: BridgeRequest,
    ) -> Result<Ticker, AppError> {
        bridge::apply_request(&mut ticker, &request, self.bridge.as_ref()).await;

        self.repo.save_ticker(&ticker).await?;
        tracing::info!(
            ticker_id = ticker.id,
            active = ticker.bridge.is_active(),
            connected = ticker.bridge.is_connected(),
            "Ticker bridge updated"
        );
        Ok(ticker)
    }

    /// Admin only. Removes the messages, then the ticker.
    pub async fn delete(&self, caller: &User, id: i64) -> Result<(), AppError> {
        guard::require_admin(caller).check()?;
        self.find(id).await?;

        let messages = self.repo.delete_ticker(id).await?;
        tracing::info!(ticker_id = id, messages, "Ticker deleted");
        Ok(())
    }

    /// Admin only. Removes the messages and deactivates the ticker.
    pub async fn reset(&self, caller: &User, id: i64) -> Result<Ticker, AppError> {
        guard::require_admin(caller).check()?;
        let mut ticker = self.find(id).await?;

        ticker.reset();
        let messages = self.repo.reset_ticker(&ticker).await?;
        tracing::info!(ticker_id = id, messages, "Ticker reset");
        Ok(ticker)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use super::*;
    use crate::bridge::testing::StaticBridge;
    use crate::db::testing::temp_repository;
    use crate::models::{BridgeConnection, Information};

    impl TickerManager {
        async fn update(
            &self,
            caller: &User,
            id: i64,
            fields: TickerFields,
        ) -> Result<Ticker, AppError> {
            let ticker = self.authorized_ticker(caller, id).await?;
            self.apply_update(ticker, fields).await
        }

        async fn update_bridge(
            &self,
            caller: &User,
            id: i64,
            request: BridgeRequest,
        ) -> Result<Ticker, AppError> {
            let ticker = self.authorized_ticker(caller, id).await?;
            self.apply_bridge(ticker, request).await
        }
    }

    struct Fixture {
        repo: Arc<Repository>,
        bridge: Arc<StaticBridge>,
        manager: TickerManager,
        admin: User,
        _dir: TempDir,
    }

    async fn fixture(bridge: StaticBridge) -> Fixture {
        let (repo, dir) = temp_repository().await;
        let repo = Arc::new(repo);
        let bridge = Arc::new(bridge);
        let admin = repo
            .create_user("admin@systemli.org", "hash", true)
            .await
            .unwrap();
        Fixture {
            manager: TickerManager::new(repo.clone(), bridge.clone()),
            repo,
            bridge,
            admin,
            _dir: dir,
        }
    }

    fn member(tickers: &[i64]) -> User {
        User {
            id: 99,
            creation_date: String::new(),
            email: "louis@systemli.org".into(),
            password_hash: String::new(),
            is_super_admin: false,
            tickers: tickers.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn fields() -> TickerFields {
        TickerFields {
            domain: "prozessticker.org".into(),
            title: "Ticker".into(),
            description: "Beschreibung".into(),
            active: true,
            prepend_time: true,
            hashtags: vec!["#test".into()],
            information: Information {
                url: "https://www.systemli.org".into(),
                email: "admin@systemli.org".into(),
                twitter: "systemli".into(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_disconnected_bridge() {
        let f = fixture(StaticBridge::returning("systemli")).await;

        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();

        assert!(ticker.id > 0);
        assert_eq!(ticker.bridge, BridgeConnection::Disconnected);
        assert_eq!(f.repo.get_ticker(ticker.id).await.unwrap(), Some(ticker));
    }

    #[tokio::test]
    async fn test_create_requires_admin_and_valid_fields() {
        let f = fixture(StaticBridge::returning("systemli")).await;

        assert!(matches!(
            f.manager.create(&member(&[]), fields()).await,
            Err(AppError::Forbidden)
        ));

        let invalid = TickerFields {
            title: "Tick".into(),
            ..fields()
        };
        assert!(matches!(
            f.manager.create(&f.admin, invalid).await,
            Err(AppError::Validation { field: "title", .. })
        ));
        assert!(f.repo.list_tickers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();

        let update = TickerFields {
            active: false,
            hashtags: vec![],
            ..fields()
        };
        let first = f
            .manager
            .update(&f.admin, ticker.id, update.clone())
            .await
            .unwrap();
        let second = f
            .manager
            .update(&f.admin, ticker.id, update)
            .await
            .unwrap();

        assert!(!first.active);
        assert!(first.hashtags.is_empty());
        assert_eq!(first, second);
        assert_eq!(f.repo.get_ticker(ticker.id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_update_leaves_bridge_untouched() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();
        let connected = f
            .manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    active: true,
                    token: "token".into(),
                    secret: "secret".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = f
            .manager
            .update(&f.admin, ticker.id, fields())
            .await
            .unwrap();
        assert_eq!(updated.bridge, connected.bridge);
    }

    #[tokio::test]
    async fn test_permission_precedes_existence_on_update() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();
        let caller = member(&[ticker.id]);
        let other = ticker.id + 1;

        // Not in the set: forbidden even though the ticker does not exist.
        assert!(matches!(
            f.manager.update(&caller, other, fields()).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            f.manager.get(&caller, other).await,
            Err(AppError::Forbidden)
        ));
        // Superadmin reaches the existence check.
        assert!(matches!(
            f.manager.update(&f.admin, other, fields()).await,
            Err(AppError::NotFound(_))
        ));

        // Existing and in the set, but invalid.
        let invalid = TickerFields {
            domain: "ab".into(),
            title: String::new(),
            ..fields()
        };
        assert!(matches!(
            f.manager.update(&caller, ticker.id, invalid).await,
            Err(AppError::Validation { field: "domain", .. })
        ));
    }

    #[tokio::test]
    async fn test_list_scoped_to_caller() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let first = f.manager.create(&f.admin, fields()).await.unwrap();
        let second = f.manager.create(&f.admin, fields()).await.unwrap();

        let all = f.manager.list(&f.admin).await.unwrap();
        assert_eq!(
            all.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let scoped = f.manager.list(&member(&[first.id])).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, first.id);

        assert!(f.manager.list(&member(&[])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bridge_disconnect_clears_state() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();
        let connect = BridgeRequest {
            active: true,
            token: "token".into(),
            secret: "secret".into(),
            ..Default::default()
        };

        let connected = f
            .manager
            .update_bridge(&f.admin, ticker.id, connect)
            .await
            .unwrap();
        assert!(connected.bridge.is_active());
        assert_eq!(
            connected.bridge.account().unwrap().screen_name,
            "systemli"
        );
        assert_eq!(f.bridge.calls(), 1);

        let disconnected = f
            .manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    disconnect: true,
                    active: true,
                    token: "other".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(disconnected.bridge, BridgeConnection::Disconnected);

        let stored = f.repo.get_ticker(ticker.id).await.unwrap().unwrap();
        assert_eq!(stored.bridge.token(), "");
        assert_eq!(stored.bridge.secret(), "");
        assert!(!stored.bridge.is_active());
        assert!(stored.bridge.account().is_none());
    }

    #[tokio::test]
    async fn test_bridge_credentials_sent_separately() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();

        let partial = f
            .manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    token: "token".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(partial.bridge.token(), "token");
        assert!(!partial.bridge.is_active());
        assert_eq!(f.bridge.calls(), 0);

        // The half pair survives a reload from the store.
        let stored = f.repo.get_ticker(ticker.id).await.unwrap().unwrap();
        assert_eq!(stored.bridge.token(), "token");
        assert_eq!(stored.bridge.secret(), "");

        let connected = f
            .manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    active: true,
                    secret: "secret".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(connected.bridge.is_connected());
        assert_eq!(connected.bridge.token(), "token");
        assert_eq!(connected.bridge.secret(), "secret");
        assert_eq!(f.bridge.calls(), 1);

        let stored = f.repo.get_ticker(ticker.id).await.unwrap().unwrap();
        assert!(stored.bridge.is_connected());
        assert_eq!(stored.bridge.account().unwrap().screen_name, "systemli");
    }

    #[tokio::test]
    async fn test_bridge_lookup_failure_is_swallowed() {
        let f = fixture(StaticBridge::failing()).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();

        let updated = f
            .manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    active: true,
                    token: "token".into(),
                    secret: "secret".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.bridge.is_active());
        assert!(updated.bridge.account().is_none());
        assert_eq!(f.bridge.calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice_yields_not_found() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();
        f.repo.insert_message(ticker.id, "Text").await.unwrap();

        assert!(matches!(
            f.manager.delete(&member(&[ticker.id]), ticker.id).await,
            Err(AppError::Forbidden)
        ));

        f.manager.delete(&f.admin, ticker.id).await.unwrap();
        assert_eq!(f.repo.count_messages(ticker.id).await.unwrap(), 0);
        assert!(matches!(
            f.manager.delete(&f.admin, ticker.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_wipes_messages_and_keeps_identity() {
        let f = fixture(StaticBridge::returning("systemli")).await;
        let ticker = f.manager.create(&f.admin, fields()).await.unwrap();
        f.manager
            .update_bridge(
                &f.admin,
                ticker.id,
                BridgeRequest {
                    active: true,
                    token: "token".into(),
                    secret: "secret".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        for i in 0..3 {
            f.repo
                .insert_message(ticker.id, &format!("message {}", i))
                .await
                .unwrap();
        }

        assert!(matches!(
            f.manager.reset(&member(&[ticker.id]), ticker.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            f.manager.reset(&f.admin, ticker.id + 1).await,
            Err(AppError::NotFound(_))
        ));

        let reset = f.manager.reset(&f.admin, ticker.id).await.unwrap();

        assert_eq!(f.repo.count_messages(ticker.id).await.unwrap(), 0);
        assert_eq!(reset.id, ticker.id);
        assert_eq!(reset.domain, ticker.domain);
        assert_eq!(reset.title, ticker.title);
        assert_eq!(reset.description, ticker.description);
        assert!(!reset.active);
        assert_eq!(reset.bridge.token(), "token");
        assert_eq!(f.repo.get_ticker(ticker.id).await.unwrap(), Some(reset));
    }
}
