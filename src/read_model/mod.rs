//! Read model
//!
//! Cache-aside repositories over the view cache. Reads try the cache, fall
//! back to the durable store and warm the cache; command services refresh
//! or invalidate views after every mutation.

mod accounts;
mod active_accounts;
mod transactions;
mod users;
mod views;

pub use accounts::AccountReadRepository;
pub use active_accounts::{
    account_count_key, ActiveAccounts, ActiveAccountsError, CachedAccountCounter,
    StoreActiveAccounts, ACCOUNT_COUNT_PREFIX,
};
pub use transactions::TransactionReadRepository;
pub use users::UserReadRepository;
pub use views::{
    account_view_key, transaction_view_key, user_view_key, AccountResponse, AccountView,
    TransactionResponse, TransactionView, UserView, ACCOUNT_VIEW_PREFIX,
    TRANSACTION_VIEW_PREFIX, USER_VIEW_PREFIX,
};
