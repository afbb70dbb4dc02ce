use async_trait::async_trait;
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

use crate::amount::Amount;
use crate::database::models::{
    Budget, BudgetLimits, Category, Direction, Month, NewTransaction, Notification,
    NotificationDraft, Transaction, TransactionFilter, UserProfile, Wallet,
};
use crate::error::Result;

/// Resolves the signed-in user.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fails with `Unauthenticated` when nobody is signed in.
    async fn current_user_id(&self) -> Result<String>;
}

/// Holder of one balance per user.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get_balance(&self, user_id: &str) -> Result<Wallet>;

    /// Apply `delta` in one atomic conditional update.
    ///
    /// A debit that would leave the balance negative fails with
    /// `InsufficientFunds` and changes nothing.
    async fn adjust_balance(
        &self,
        user_id: &str,
        delta: Amount,
        direction: Direction,
    ) -> Result<Wallet>;
}

/// Append-only log of completed money movements.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionRecorder: Send + Sync {
    async fn record(&self, user_id: &str, entry: &NewTransaction) -> Result<Transaction>;

    /// Newest first.
    async fn list(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    async fn count_for(&self, user_id: &str) -> Result<u64>;

    /// Debit totals per category for transactions dated within `month`.
    async fn sum_by_category(&self, user_id: &str, month: Month)
        -> Result<BTreeMap<Category, Amount>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create(&self, user_id: &str, draft: &NotificationDraft) -> Result<Notification>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    /// Newest first; `read_status` narrows to read or unread notifications.
    async fn list_notifications(
        &self,
        user_id: &str,
        read_status: Option<bool>,
    ) -> Result<Vec<Notification>>;

    async fn unread_count(&self, user_id: &str) -> Result<u64>;

    async fn mark_read(&self, user_id: &str, notification_id: i64) -> Result<()>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user_id: &str) -> Result<u64>;

    /// Returns how many notifications were removed.
    async fn delete_all(&self, user_id: &str) -> Result<u64>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Insert or replace the limits of `(user_id, month)`.
    async fn upsert_budget(
        &self,
        user_id: &str,
        month: Month,
        limits: &BudgetLimits,
    ) -> Result<Budget>;

    async fn get_budget(&self, user_id: &str, month: Month) -> Result<Option<Budget>>;
}
