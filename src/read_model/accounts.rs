//! Account read repository

use std::sync::Arc;

use crate::cache::{CacheStore, ViewCache};
use crate::store::{AccountStore, StoreResult};

use super::{account_view_key, AccountView};

/// Cache-aside reads of account views
#[derive(Clone)]
pub struct AccountReadRepository {
    store: Arc<dyn AccountStore>,
    cache: ViewCache<AccountView>,
}

impl AccountReadRepository {
    pub fn new(store: Arc<dyn AccountStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            cache: ViewCache::new(cache, None),
        }
    }

    /// Fetch a view, warming the cache on a miss
    pub async fn get(&self, account_number: &str) -> StoreResult<AccountView> {
        let key = account_view_key(account_number);
        if let Some(view) = self.cache.get(&key).await {
            return Ok(view);
        }

        let account = self.store.get(account_number).await?;
        let view = AccountView::from(&account);
        tracing::debug!(account_number, "Account view cache miss, warmed from store");
        self.cache.warm(&key, &view).await;

        Ok(view)
    }

    /// All live accounts of a user, read from the store
    pub async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<AccountView>> {
        let accounts = self.store.list_by_user(user_id).await?;
        Ok(accounts.iter().map(AccountView::from).collect())
    }

    /// Store or refresh a view
    pub async fn cache_view(&self, view: &AccountView) {
        self.cache
            .set(&account_view_key(&view.account_number), view)
            .await;
    }

    pub async fn invalidate(&self, account_number: &str) {
        self.cache.delete(&account_view_key(account_number)).await;
    }
}
