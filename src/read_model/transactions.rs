//! Transaction read repository

use std::sync::Arc;

use crate::cache::{CacheStore, ViewCache};
use crate::store::{StoreResult, TransactionStore};

use super::{transaction_view_key, TransactionView};

/// Cache-aside reads of transaction views
#[derive(Clone)]
pub struct TransactionReadRepository {
    store: Arc<dyn TransactionStore>,
    cache: ViewCache<TransactionView>,
}

impl TransactionReadRepository {
    pub fn new(store: Arc<dyn TransactionStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            cache: ViewCache::new(cache, None),
        }
    }

    /// Fetch a view scoped to its account, warming the cache on a miss
    pub async fn get(
        &self,
        transaction_id: &str,
        account_number: &str,
    ) -> StoreResult<TransactionView> {
        let key = transaction_view_key(account_number, transaction_id);
        if let Some(view) = self.cache.get(&key).await {
            return Ok(view);
        }

        let transaction = self.store.get(transaction_id, account_number).await?;
        let view = TransactionView::from(&transaction);
        self.cache.warm(&key, &view).await;

        Ok(view)
    }

    /// All transactions of an account, read from the store
    pub async fn list_by_account(&self, account_number: &str) -> StoreResult<Vec<TransactionView>> {
        let transactions = self.store.list_by_account(account_number).await?;
        Ok(transactions.iter().map(TransactionView::from).collect())
    }

    pub async fn cache_view(&self, view: &TransactionView) {
        let key = transaction_view_key(&view.account_number, &view.id);
        self.cache.set(&key, view).await;
    }
}
