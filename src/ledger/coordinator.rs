use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::amount::Amount;
use crate::database::models::{
    Category, Direction, NewTransaction, NotificationDraft, NotificationKind, Transaction,
};
use crate::error::{LedgerError, Result};
use crate::ledger::traits::{NotificationSink, SessionProvider, TransactionRecorder, WalletStore};
use crate::retry::with_timeout;
use crate::utils::{Formatter, Logger};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(15);

/// One requested money movement for the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRequest {
    /// Raw user amount; validated and rounded to cents by the coordinator.
    pub amount: f64,
    pub direction: Direction,
    pub category: Category,
    pub detail: Option<String>,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub external_ref: Option<String>,
}

impl LedgerRequest {
    pub fn payment(
        amount: f64,
        category: Category,
        detail: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            direction: Direction::Debit,
            category,
            detail,
            description: description.into(),
            date: None,
            external_ref: None,
        }
    }

    pub fn top_up(amount: f64, external_ref: Option<String>) -> Self {
        Self {
            amount,
            direction: Direction::Credit,
            category: Category::TopUp,
            detail: None,
            description: "Wallet top-up".to_string(),
            date: None,
            external_ref,
        }
    }

    fn destination(&self) -> String {
        match (&self.category, &self.detail) {
            (Category::Other, Some(detail)) => detail.clone(),
            (category, _) => category.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    Idle,
    Rejected,
    BalanceAdjusted,
    RolledBack,
    Recorded,
    NotificationSent,
}

impl fmt::Display for LedgerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Applies a balance change and its transaction record together.
///
/// The balance is adjusted first. When recording then fails, a compensating
/// adjustment in the opposite direction restores the balance and the recording
/// error is returned. A notification is sent after a successful record; its
/// failure is logged and does not affect the outcome.
#[derive(Clone)]
pub struct LedgerCoordinator {
    session: Arc<dyn SessionProvider>,
    wallets: Arc<dyn WalletStore>,
    recorder: Arc<dyn TransactionRecorder>,
    notifier: Arc<dyn NotificationSink>,
    step_timeout: Duration,
    currency_symbol: String,
}

impl LedgerCoordinator {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        wallets: Arc<dyn WalletStore>,
        recorder: Arc<dyn TransactionRecorder>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            session,
            wallets,
            recorder,
            notifier,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            currency_symbol: "৳".to_string(),
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Run a movement for whoever the session currently names.
    pub async fn execute(&self, request: LedgerRequest) -> Result<Transaction> {
        let mut state = LedgerState::Idle;
        let user_id = match with_timeout(
            self.step_timeout,
            "session lookup",
            self.session.current_user_id(),
        )
        .await
        {
            Ok(user_id) => user_id,
            Err(e) => {
                transition(&mut state, LedgerState::Rejected, "-");
                return Err(e);
            }
        };

        self.execute_for(&user_id, request).await
    }

    /// Run a movement for an already resolved user. Callers that authorized
    /// `user_id` themselves (the PIN gate) must use this so the wallet that
    /// moves is the one that was checked.
    pub async fn execute_for(&self, user_id: &str, request: LedgerRequest) -> Result<Transaction> {
        let mut state = LedgerState::Idle;
        let user_id = user_id.to_string();

        let amount = match Amount::from_input(request.amount) {
            Ok(amount) => amount,
            Err(e) => {
                transition(&mut state, LedgerState::Rejected, &user_id);
                return Err(e);
            }
        };

        Logger::log_operation_start(
            "Ledger movement",
            &format!("{user_id} {} {amount} {}", request.direction, request.category),
        );

        let wallet = match with_timeout(
            self.step_timeout,
            "balance adjustment",
            self.wallets.adjust_balance(&user_id, amount, request.direction),
        )
        .await
        {
            Ok(wallet) => wallet,
            Err(e) => {
                transition(&mut state, LedgerState::Rejected, &user_id);
                let details = format!("user={user_id}: {e}");
                if e.is_domain_error() {
                    Logger::log_operation_rejected("Ledger movement", &details);
                } else {
                    Logger::log_operation_failure("Ledger movement", &details);
                }
                return Err(e);
            }
        };
        transition(&mut state, LedgerState::BalanceAdjusted, &user_id);

        let entry = NewTransaction {
            amount,
            direction: request.direction,
            category: request.category,
            detail: request.detail.clone(),
            description: request.description.clone(),
            date: request.date,
            external_ref: request.external_ref.clone(),
        };

        let transaction = match with_timeout(
            self.step_timeout,
            "transaction record",
            self.recorder.record(&user_id, &entry),
        )
        .await
        {
            Ok(transaction) => transaction,
            Err(record_error) => {
                error!(
                    "Recording failed after balance adjustment: user={} amount={} direction={} step=record: {}",
                    user_id, amount, request.direction, record_error
                );
                transition(&mut state, LedgerState::RolledBack, &user_id);
                return Err(self.compensate(&user_id, amount, request.direction, record_error).await);
            }
        };
        transition(&mut state, LedgerState::Recorded, &user_id);

        let draft = self.notification_for(&request, amount, &transaction);
        match with_timeout(
            self.step_timeout,
            "notification",
            self.notifier.create(&user_id, &draft),
        )
        .await
        {
            Ok(notification) => debug!(
                "Notification {} sent for transaction {}",
                notification.id, transaction.id
            ),
            Err(e) => {
                let failure = LedgerError::notification_failed(e.to_string());
                warn!("Transaction {} kept: {}", transaction.id, failure);
            }
        }
        transition(&mut state, LedgerState::NotificationSent, &user_id);

        Logger::log_operation_success(
            "Ledger movement",
            &format!(
                "transaction {} for {user_id}, balance now {}",
                transaction.id, wallet.balance
            ),
        );
        info!(
            "{} of {} recorded as transaction {}",
            request.direction, amount, transaction.id
        );
        Ok(transaction)
    }

    /// Undo a committed adjustment. Returns the error to surface to the caller,
    /// which is always the one that triggered the compensation.
    async fn compensate(
        &self,
        user_id: &str,
        amount: Amount,
        direction: Direction,
        original: LedgerError,
    ) -> LedgerError {
        let reverse = direction.opposite();
        match with_timeout(
            self.step_timeout,
            "compensating adjustment",
            self.wallets.adjust_balance(user_id, amount, reverse),
        )
        .await
        {
            Ok(wallet) => {
                info!(
                    "Compensating {} of {} for {} restored balance to {}",
                    reverse, amount, user_id, wallet.balance
                );
                original
            }
            Err(rollback) => {
                let fault = LedgerError::RollbackFailed {
                    original: Box::new(original),
                    rollback: Box::new(rollback),
                };
                error!(
                    "CRITICAL [{}] balance and history disagree, manual reconciliation needed: user={} amount={} direction={} step=rollback: {}",
                    fault.severity(),
                    user_id,
                    amount,
                    direction,
                    fault
                );
                fault.into_original()
            }
        }
    }

    fn notification_for(
        &self,
        request: &LedgerRequest,
        amount: Amount,
        transaction: &Transaction,
    ) -> NotificationDraft {
        let shown = Formatter::format_amount(&self.currency_symbol, amount);
        let (title, message) = match request.direction {
            Direction::Credit => (
                "Top-up Successful".to_string(),
                format!("Your account has been topped up with {shown}"),
            ),
            Direction::Debit => (
                "Payment Successful".to_string(),
                format!("Payment of {shown} to {} was successful", request.destination()),
            ),
        };

        NotificationDraft {
            title,
            message,
            kind: NotificationKind::Transaction,
            related_entity_id: Some(transaction.id.to_string()),
        }
    }
}

fn transition(state: &mut LedgerState, next: LedgerState, user_id: &str) {
    debug!("Ledger run for {user_id}: {state} -> {next}");
    *state = next;
}
