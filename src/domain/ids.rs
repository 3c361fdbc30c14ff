//! Record identifiers
//!
//! Generation and format checks for user, account and transaction keys.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Prefix of user ids
pub const USER_ID_PREFIX: &str = "usr";

/// Prefix of transaction ids
pub const TRANSACTION_ID_PREFIX: &str = "tan";

const ID_SUFFIX_LEN: usize = 10;

/// Generate `<prefix>-<10 alphanumeric chars>`
pub fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{prefix}-{suffix}")
}

/// Generate an 8-digit account number starting with `01`
pub fn generate_account_number() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("01{n:06}")
}

pub fn is_valid_account_number(account_number: &str) -> bool {
    account_number.len() == 8
        && account_number.starts_with("01")
        && account_number.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_transaction_id(transaction_id: &str) -> bool {
    transaction_id
        .strip_prefix(TRANSACTION_ID_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|suffix| {
            !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}
