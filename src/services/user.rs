//! User services

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::{generate_id, User, UserCreated, UserDeleted, UserUpdated, USER_ID_PREFIX};
use crate::error::{AppError, AppResult};
use crate::event_log::Publisher;
use crate::read_model::{ActiveAccounts, UserReadRepository, UserView};
use crate::store::UserStore;

use super::{
    CreateUserCommand, DeleteUserCommand, GetUserQuery, UpdateUserCommand, UserCommander,
    UserQuerier,
};

/// Users may only act on themselves
fn ensure_self(user_id: &str, requesting_user_id: &str) -> AppResult<()> {
    if user_id != requesting_user_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Writes users and keeps their views current
#[derive(Clone)]
pub struct UserCommandService {
    store: Arc<dyn UserStore>,
    views: UserReadRepository,
    active_accounts: Arc<dyn ActiveAccounts>,
    publisher: Publisher,
}

impl UserCommandService {
    pub fn new(
        store: Arc<dyn UserStore>,
        views: UserReadRepository,
        active_accounts: Arc<dyn ActiveAccounts>,
        publisher: Publisher,
    ) -> Self {
        Self {
            store,
            views,
            active_accounts,
            publisher,
        }
    }
}

#[async_trait]
impl UserCommander for UserCommandService {
    async fn create_user(&self, command: CreateUserCommand) -> AppResult<User> {
        let now = Utc::now();
        let user = User {
            id: generate_id(USER_ID_PREFIX),
            name: command.name,
            email: command.email,
            phone_number: command.phone_number,
            address: command.address,
            created_at: now,
            updated_at: now,
        };

        self.store.create(&user).await?;
        self.views.cache_view(&UserView::from(&user)).await;
        self.publisher
            .notify(&UserCreated {
                user_id: user.id.clone(),
                email: user.email.clone(),
                name: user.name.clone(),
            })
            .await;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update_user(&self, command: UpdateUserCommand) -> AppResult<UserView> {
        ensure_self(&command.user_id, &command.requesting_user_id)?;

        let mut user = self.store.get(&command.user_id).await?;
        user.name = command.name;
        user.email = command.email;
        user.phone_number = command.phone_number;
        user.address = command.address;
        user.updated_at = Utc::now();

        self.store.update(&user).await?;
        let view = UserView::from(&user);
        self.views.cache_view(&view).await;

        self.publisher
            .notify(&UserUpdated {
                user_id: user.id.clone(),
                email: user.email.clone(),
                name: user.name.clone(),
            })
            .await;

        Ok(view)
    }

    async fn delete_user(&self, command: DeleteUserCommand) -> AppResult<()> {
        ensure_self(&command.user_id, &command.requesting_user_id)?;

        if self
            .active_accounts
            .has_active_accounts(&command.user_id)
            .await?
        {
            return Err(AppError::Conflict("user has active accounts".to_string()));
        }

        self.store.soft_delete(&command.user_id).await?;
        self.views.invalidate(&command.user_id).await;

        self.publisher
            .notify(&UserDeleted {
                user_id: command.user_id.clone(),
            })
            .await;

        tracing::info!(user_id = %command.user_id, "User deleted");
        Ok(())
    }
}

/// Serves user reads; users may only read themselves
#[derive(Clone)]
pub struct UserQueryService {
    views: UserReadRepository,
}

impl UserQueryService {
    pub fn new(views: UserReadRepository) -> Self {
        Self { views }
    }
}

#[async_trait]
impl UserQuerier for UserQueryService {
    async fn get_user(&self, query: GetUserQuery) -> AppResult<UserView> {
        ensure_self(&query.user_id, &query.requesting_user_id)?;
        Ok(self.views.get(&query.user_id).await?)
    }
}
