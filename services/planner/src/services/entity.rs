//! Owner-scoped CRUD over one backend table

use std::{marker::PhantomData, sync::Arc};

use common::{
    AuthBackend, AuthUser, Backend, ChangeCallback, ChannelSpec, Order, Query, RemoteStore,
    Subscription,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ServiceError, ServiceResult};

/// A record family stored in one table
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Payload accepted by [`EntityService::create`]
    type Draft: Serialize + Send + Sync;

    const TABLE: &'static str;
    /// Ordering applied to every listing
    const ORDER: Order;
    /// Name used in log lines
    const LABEL: &'static str;

    fn id(&self) -> &str;
}

/// CRUD service for one entity family
///
/// Every call resolves the signed-in user first and scopes the query to
/// rows that user owns.
pub struct EntityService<E> {
    backend: Arc<dyn Backend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityService<E> {
    /// Create a new entity service
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    /// Get the active session's user
    pub async fn current_user(&self) -> ServiceResult<AuthUser> {
        match self.backend.get_user().await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                warn!("No user session found for {} access", E::LABEL);
                Err(ServiceError::AuthenticationRequired)
            }
            Err(e) => {
                warn!("Identity check failed for {} access: {}", E::LABEL, e);
                Err(ServiceError::AuthenticationRequired)
            }
        }
    }

    /// List the current user's records, optionally filtered on one more column
    pub async fn list(&self, filter: Option<(&str, &str)>) -> ServiceResult<Vec<E>> {
        let user = self.current_user().await?;

        let mut query = Query::from(E::TABLE).eq("user_id", user.id);
        if let Some((column, value)) = filter {
            query = query.eq(column, value);
        }
        let query = query.order(E::ORDER);

        let rows = self.backend.select(&query).await.map_err(|e| {
            warn!("{} fetch failed ({}): {}", E::LABEL, query, e);
            ServiceError::FetchFailed(e)
        })?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<E>, _>>()
            .map_err(|e| {
                warn!("{} fetch returned an unreadable row: {}", E::LABEL, e);
                ServiceError::FetchFailed(e.into())
            })
    }

    /// Insert a record owned by the current user
    ///
    /// Returns the stored record, or `None` when the backend kept no row.
    pub async fn create(&self, draft: &E::Draft) -> ServiceResult<Option<E>> {
        let user = self.current_user().await?;

        let mut row =
            serde_json::to_value(draft).map_err(|e| ServiceError::WriteFailed(e.into()))?;
        let Some(fields) = row.as_object_mut() else {
            return Err(ServiceError::Validation(format!(
                "{} payload must be an object",
                E::LABEL
            )));
        };
        fields.insert("user_id".to_string(), Value::String(user.id));

        let created = self.backend.insert(E::TABLE, row).await.map_err(|e| {
            error!("Add {} failed: {}", E::LABEL, e);
            ServiceError::WriteFailed(e)
        })?;

        let created = Self::decode_written(created)?;
        if let Some(record) = &created {
            info!("Created {} {}", E::LABEL, record.id());
        }
        Ok(created)
    }

    /// Apply a partial update to one of the current user's records
    pub async fn update<P>(&self, id: &str, patch: &P) -> ServiceResult<Option<E>>
    where
        P: Serialize + Sync,
    {
        let user = self.current_user().await?;

        let patch = serde_json::to_value(patch).map_err(|e| ServiceError::WriteFailed(e.into()))?;
        let query = Query::from(E::TABLE).eq("id", id).eq("user_id", user.id);

        let updated = self.backend.update(&query, patch).await.map_err(|e| {
            error!("Update {} {} failed: {}", E::LABEL, id, e);
            ServiceError::WriteFailed(e)
        })?;

        Self::decode_written(updated)
    }

    /// Delete one of the current user's records
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let user = self.current_user().await?;
        let query = Query::from(E::TABLE).eq("id", id).eq("user_id", user.id);

        self.backend.delete(&query).await.map_err(|e| {
            error!("Delete {} {} failed: {}", E::LABEL, id, e);
            ServiceError::WriteFailed(e)
        })?;

        info!("Deleted {} {}", E::LABEL, id);
        Ok(())
    }

    /// Follow every change to records owned by `owner_id`
    ///
    /// Callers are expected to refetch on each change rather than merge
    /// the payload.
    pub async fn subscribe(
        &self,
        owner_id: &str,
        on_change: ChangeCallback,
    ) -> ServiceResult<Subscription> {
        let channel = ChannelSpec::owner_scoped(E::TABLE, owner_id);
        let name = channel.name.clone();

        match self.backend.subscribe(channel, on_change).await {
            Ok(subscription) => {
                info!("Subscribed to {}", name);
                Ok(subscription)
            }
            Err(e) => {
                warn!("Real-time subscription to {} failed: {}", name, e);
                Err(ServiceError::SubscriptionFailed(e))
            }
        }
    }

    fn decode_written(row: Option<Value>) -> ServiceResult<Option<E>> {
        row.map(serde_json::from_value).transpose().map_err(|e| {
            error!("{} write returned an unreadable row: {}", E::LABEL, e);
            ServiceError::WriteFailed(e.into())
        })
    }
}
