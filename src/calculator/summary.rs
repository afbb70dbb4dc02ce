use log::debug;
use std::sync::Arc;

use crate::amount::Amount;
use crate::calculator::budget::BudgetCalculator;
use crate::database::models::{HomeSummary, Month, TransactionFilter};
use crate::error::Result;
use crate::ledger::traits::{NotificationInbox, TransactionRecorder, WalletStore};
use crate::retry::{retry_with_backoff, RetryConfig};

pub const RECENT_TRANSACTIONS: usize = 5;

/// Builds the home screen from independent reads.
#[derive(Clone)]
pub struct SummaryCalculator {
    wallets: Arc<dyn WalletStore>,
    recorder: Arc<dyn TransactionRecorder>,
    inbox: Arc<dyn NotificationInbox>,
    budgets: BudgetCalculator,
    default_monthly_limit: Amount,
    retry: RetryConfig,
}

impl SummaryCalculator {
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        recorder: Arc<dyn TransactionRecorder>,
        inbox: Arc<dyn NotificationInbox>,
        budgets: BudgetCalculator,
        default_monthly_limit: Amount,
    ) -> Self {
        Self {
            wallets,
            recorder,
            inbox,
            budgets,
            default_monthly_limit,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn home(&self, user_id: &str) -> Result<HomeSummary> {
        let month = Month::current();
        let wallets = &self.wallets;
        let recorder = &self.recorder;
        let inbox = &self.inbox;
        let budgets = &self.budgets;

        let (wallet, spending, limit, recent_transactions, unread_notifications) = futures::try_join!(
            retry_with_backoff(
                move || wallets.get_balance(user_id),
                self.retry.clone(),
                "home balance",
            ),
            retry_with_backoff(
                move || recorder.sum_by_category(user_id, month),
                self.retry.clone(),
                "home spending",
            ),
            retry_with_backoff(
                move || budgets.monthly_limit(user_id, month),
                self.retry.clone(),
                "home budget",
            ),
            retry_with_backoff(
                move || async move {
                    recorder
                        .list(user_id, &TransactionFilter::recent(RECENT_TRANSACTIONS))
                        .await
                },
                self.retry.clone(),
                "home recent transactions",
            ),
            retry_with_backoff(
                move || inbox.unread_count(user_id),
                self.retry.clone(),
                "home unread notifications",
            ),
        )?;

        let monthly_limit = if limit.is_zero() {
            self.default_monthly_limit
        } else {
            limit
        };
        let monthly_spent: Amount = spending.into_values().sum();

        debug!(
            "Home summary for {user_id}: balance {} spent {monthly_spent} of {monthly_limit}",
            wallet.balance
        );

        Ok(HomeSummary {
            balance: wallet.balance,
            monthly_spent,
            monthly_limit,
            recent_transactions,
            unread_notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        Budget, BudgetLimits, Category, Direction, Transaction, TransactionStatus, Wallet,
    };
    use crate::error::LedgerError;
    use crate::ledger::traits::{
        MockBudgetStore, MockNotificationInbox, MockTransactionRecorder, MockWalletStore,
    };
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    fn wallet(cents: i64) -> Wallet {
        Wallet {
            id: 1,
            user_id: "user-1".to_string(),
            balance: Amount::from_cents(cents),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn transaction(id: i64, cents: i64) -> Transaction {
        Transaction {
            id,
            user_id: "user-1".to_string(),
            amount: Amount::from_cents(cents),
            direction: Direction::Debit,
            category: Category::Canteen,
            detail: None,
            description: "Lunch".to_string(),
            date: Utc::now().date_naive(),
            created_at: Utc::now(),
            external_ref: None,
            status: TransactionStatus::Completed,
        }
    }

    fn recorder() -> MockTransactionRecorder {
        let mut recorder = MockTransactionRecorder::new();
        recorder.expect_sum_by_category().returning(|_, _| {
            let mut totals = BTreeMap::new();
            totals.insert(Category::Canteen, Amount::from_cents(12_000));
            totals.insert(Category::Lab, Amount::from_cents(3_000));
            Ok(totals)
        });
        recorder
            .expect_list()
            .withf(|_, filter| filter.limit == Some(RECENT_TRANSACTIONS))
            .returning(|_, _| Ok(vec![transaction(2, 5_000), transaction(1, 7_000)]));
        recorder
    }

    fn inbox(unread: u64) -> MockNotificationInbox {
        let mut inbox = MockNotificationInbox::new();
        inbox.expect_unread_count().returning(move |_| Ok(unread));
        inbox
    }

    fn calculator(
        wallets: MockWalletStore,
        budgets: MockBudgetStore,
        default_limit: Amount,
    ) -> SummaryCalculator {
        let recorder: Arc<dyn TransactionRecorder> = Arc::new(recorder());
        SummaryCalculator::new(
            Arc::new(wallets),
            recorder.clone(),
            Arc::new(inbox(3)),
            BudgetCalculator::new(Arc::new(budgets), recorder),
            default_limit,
        )
        .with_retry(fast_retry())
    }

    #[tokio::test]
    async fn home_combines_every_read() {
        let mut wallets = MockWalletStore::new();
        wallets.expect_get_balance().returning(|_| Ok(wallet(85_000)));
        let mut budgets = MockBudgetStore::new();
        budgets.expect_get_budget().returning(|user_id, month| {
            Ok(Some(Budget {
                id: 1,
                user_id: user_id.to_string(),
                month,
                limits: BudgetLimits {
                    canteen: Amount::from_cents(100_000),
                    lab: Amount::from_cents(50_000),
                    ..BudgetLimits::default()
                },
                created_at: Utc::now(),
            }))
        });

        let summary = calculator(wallets, budgets, Amount::from_cents(200_000))
            .home("user-1")
            .await
            .unwrap();

        assert_eq!(summary.balance, Amount::from_cents(85_000));
        assert_eq!(summary.monthly_spent, Amount::from_cents(15_000));
        assert_eq!(summary.monthly_limit, Amount::from_cents(150_000));
        assert_eq!(summary.recent_transactions.len(), 2);
        assert_eq!(summary.recent_transactions[0].id, 2);
        assert_eq!(summary.unread_notifications, 3);
    }

    #[tokio::test]
    async fn missing_budget_falls_back_to_default_limit() {
        let mut wallets = MockWalletStore::new();
        wallets.expect_get_balance().returning(|_| Ok(wallet(0)));
        let mut budgets = MockBudgetStore::new();
        budgets.expect_get_budget().returning(|_, _| Ok(None));

        let summary = calculator(wallets, budgets, Amount::from_cents(200_000))
            .home("user-1")
            .await
            .unwrap();
        assert_eq!(summary.monthly_limit, Amount::from_cents(200_000));
    }

    #[tokio::test]
    async fn transient_store_faults_are_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        let mut wallets = MockWalletStore::new();
        wallets.expect_get_balance().returning(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(LedgerError::store_unavailable("busy"))
            } else {
                Ok(wallet(1_000))
            }
        });
        let mut budgets = MockBudgetStore::new();
        budgets.expect_get_budget().returning(|_, _| Ok(None));

        let summary = calculator(wallets, budgets, Amount::ZERO)
            .home("user-1")
            .await
            .unwrap();
        assert_eq!(summary.balance, Amount::from_cents(1_000));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn domain_errors_are_not_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let seen = attempts.clone();

        let mut wallets = MockWalletStore::new();
        wallets.expect_get_balance().returning(move |user_id| {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::wallet_not_found(user_id))
        });
        let mut budgets = MockBudgetStore::new();
        budgets.expect_get_budget().returning(|_, _| Ok(None));

        let err = calculator(wallets, budgets, Amount::ZERO)
            .home("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::WalletNotFound { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
