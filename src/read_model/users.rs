//! User read repository

use std::sync::Arc;

use crate::cache::{CacheStore, ViewCache};
use crate::store::{StoreResult, UserStore};

use super::{user_view_key, UserView};

/// Cache-aside reads of user views
#[derive(Clone)]
pub struct UserReadRepository {
    store: Arc<dyn UserStore>,
    cache: ViewCache<UserView>,
}

impl UserReadRepository {
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            cache: ViewCache::new(cache, None),
        }
    }

    pub async fn get(&self, user_id: &str) -> StoreResult<UserView> {
        let key = user_view_key(user_id);
        if let Some(view) = self.cache.get(&key).await {
            return Ok(view);
        }

        let user = self.store.get(user_id).await?;
        let view = UserView::from(&user);
        self.cache.warm(&key, &view).await;

        Ok(view)
    }

    pub async fn cache_view(&self, view: &UserView) {
        self.cache.set(&user_view_key(&view.id), view).await;
    }

    pub async fn invalidate(&self, user_id: &str) {
        self.cache.delete(&user_view_key(user_id)).await;
    }
}
