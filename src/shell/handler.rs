use log::{debug, warn};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::amount::Amount;
use crate::calculator::{BudgetCalculator, SummaryCalculator};
use crate::config::Settings;
use crate::database::models::{
    BudgetLimits, Category, Direction, Month, NewUser, Transaction, TransactionFilter,
    TransactionStatus,
};
use crate::database::DatabaseOperations;
use crate::error::{LedgerError, Result};
use crate::ledger::{
    LedgerCoordinator, NotificationInbox, PaymentFlow, PaymentOutcome, PinGate, ProfileStore,
    SessionProvider, StaticSession, TransactionRecorder, WalletStore,
};
use crate::parser::InputParser;
use crate::retry::RetryConfig;
use crate::shell::commands::{Command, HELP_TEXT};
use crate::utils::Formatter;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const READ_FAILURE_MESSAGE: &str = "Something went wrong, please try again.";

/// Executes shell commands for the signed-in user and renders replies.
#[derive(Clone)]
pub struct ShellHandler {
    db: DatabaseOperations,
    session: Arc<StaticSession>,
    payments: PaymentFlow,
    budgets: BudgetCalculator,
    summary: SummaryCalculator,
    parser: InputParser,
    currency_symbol: String,
}

impl ShellHandler {
    pub fn new(db: DatabaseOperations, session: Arc<StaticSession>, settings: &Settings) -> Self {
        let store = Arc::new(db.clone());

        let coordinator = LedgerCoordinator::new(
            session.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
        .with_step_timeout(settings.store_timeout())
        .with_currency_symbol(settings.currency_symbol.clone());
        let payments = PaymentFlow::new(session.clone(), PinGate::new(store.clone()), coordinator);

        let budgets = BudgetCalculator::new(store.clone(), store.clone());
        let summary = SummaryCalculator::new(
            store.clone(),
            store.clone(),
            store,
            budgets.clone(),
            settings.default_monthly_limit(),
        )
        .with_retry(RetryConfig::with_attempts(settings.max_retry_attempts));

        Self {
            db,
            session,
            payments,
            budgets,
            summary,
            parser: InputParser::new(),
            currency_symbol: settings.currency_symbol.clone(),
        }
    }

    /// Reply to one input line; `None` ends the session.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let command = match Command::parse(line, &self.parser) {
            Ok(Some(Command::Quit)) => return None,
            Ok(Some(command)) => command,
            Ok(None) => return Some(String::new()),
            Err(e) => return Some(format!("❌ {e}")),
        };
        debug!("Shell command: {command:?}");

        let reply = match command {
            Command::TopUp {
                amount,
                external_ref,
            } => self.top_up(amount, external_ref).await,
            Command::Pay {
                amount,
                pin,
                destination,
                description,
            } => self.pay(amount, &pin, &destination, &description).await,
            other => self.execute(other).await.unwrap_or_else(|e| {
                if e.is_domain_error() {
                    format!("❌ {e}")
                } else {
                    warn!("Shell read failed [{}]: {e}", e.severity());
                    format!("❌ {READ_FAILURE_MESSAGE}")
                }
            }),
        };
        Some(reply)
    }

    async fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::Register(new_user) => self.register(new_user).await,
            Command::Login { username } => self.login(&username).await,
            Command::Logout => {
                self.session.sign_out().await;
                Ok("👋 Signed out".to_string())
            }
            Command::WhoAmI => self.whoami().await,
            Command::Balance => self.balance().await,
            Command::History {
                category,
                limit,
                json,
            } => self.history(category, limit, json).await,
            Command::Spending { month } => self.spending(month.unwrap_or_else(Month::current)).await,
            Command::Budget { month } => self.budget(month.unwrap_or_else(Month::current)).await,
            Command::SetBudget(limits) => self.set_budget(&limits).await,
            Command::Home => self.home().await,
            Command::Notifications { unread_only } => self.notifications(unread_only).await,
            Command::Read { notification_id } => self.read(notification_id).await,
            Command::Clear => {
                let user_id = self.session.current_user_id().await?;
                let removed = self.db.delete_all(&user_id).await?;
                Ok(format!("🗑 Deleted {removed} notification(s)"))
            }
            Command::Quit | Command::TopUp { .. } | Command::Pay { .. } => {
                Err(LedgerError::invalid_input("command is handled by the payment flow"))
            }
        }
    }

    fn money(&self, amount: Amount) -> String {
        Formatter::format_amount(&self.currency_symbol, amount)
    }

    fn money_failure(&self, error: &LedgerError) -> String {
        format!("❌ {}\nTry again from the summary step.", error.user_message())
    }

    async fn top_up(&self, amount: f64, external_ref: Option<String>) -> String {
        match self.payments.confirm_top_up(amount, external_ref).await {
            Ok(transaction) => {
                let mut reply = format!(
                    "✅ Topped up {} (transaction #{})",
                    self.money(transaction.amount),
                    transaction.id
                );
                if transaction.status == TransactionStatus::Pending {
                    reply.push_str("\n⏳ Awaiting card confirmation");
                }
                reply
            }
            Err(e) => self.money_failure(&e),
        }
    }

    async fn pay(&self, amount: f64, pin: &str, destination: &str, description: &str) -> String {
        if !self.parser.is_pin_format(pin) {
            return "🔒 PIN must be 5 digits, please try again.".to_string();
        }

        match self
            .payments
            .confirm_payment(pin, destination, amount, description)
            .await
        {
            Ok(PaymentOutcome::Completed(transaction)) => format!(
                "✅ Paid {} to {} (transaction #{})",
                self.money(transaction.amount),
                destination_name(&transaction),
                transaction.id
            ),
            Ok(PaymentOutcome::PinRejected) => "🔒 Incorrect PIN, please try again.".to_string(),
            Err(e) => self.money_failure(&e),
        }
    }

    async fn register(&self, new_user: NewUser) -> Result<String> {
        let profile = self.db.register_user(&new_user).await?;
        Ok(format!(
            "✅ Registered {} with an empty wallet. Sign in with /login {}",
            profile.full_name, profile.username
        ))
    }

    async fn login(&self, username: &str) -> Result<String> {
        let profile = self.db.find_profile_by_username(username).await?;
        self.session.sign_in(profile.id.clone()).await;
        Ok(format!("👋 Welcome, {}", profile.full_name))
    }

    async fn whoami(&self) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let profile = self.db.get_profile(&user_id).await?;
        Ok(format!(
            "👤 {} (@{})\nStudent ID: {}\nContact: {}\nMember since: {}",
            profile.full_name,
            profile.username,
            profile.student_id,
            profile.contact_number,
            Formatter::format_timestamp(profile.created_at)
        ))
    }

    async fn balance(&self) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let wallet = self.db.get_balance(&user_id).await?;
        Ok(format!("💰 Balance: {}", self.money(wallet.balance)))
    }

    async fn history(
        &self,
        category: Option<Category>,
        limit: Option<usize>,
        json: bool,
    ) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let filter = TransactionFilter {
            category,
            limit: Some(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
            ..TransactionFilter::default()
        };
        let transactions = self.db.list(&user_id, &filter).await?;

        if json {
            return serde_json::to_string_pretty(&transactions)
                .map_err(|e| LedgerError::invalid_input(format!("cannot render history: {e}")));
        }

        if transactions.is_empty() {
            return Ok("No transactions yet".to_string());
        }

        let total = self.db.count_for(&user_id).await?;
        let mut reply = format!("📜 Showing {} of {total} transaction(s)", transactions.len());
        for transaction in &transactions {
            let sign = match transaction.direction {
                Direction::Credit => "+",
                Direction::Debit => "-",
            };
            let _ = write!(
                reply,
                "\n#{} {} {sign}{} {}",
                transaction.id,
                transaction.date,
                self.money(transaction.amount),
                destination_name(transaction)
            );
            if !transaction.description.is_empty() {
                let _ = write!(reply, " · {}", transaction.description);
            }
            if transaction.status == TransactionStatus::Pending {
                reply.push_str(" [pending]");
            }
        }
        Ok(reply)
    }

    async fn spending(&self, month: Month) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let totals = self.db.sum_by_category(&user_id, month).await?;

        let mut reply = format!("📊 Spending in {month}");
        for category in Category::SPENDING {
            let spent = totals.get(&category).copied().unwrap_or(Amount::ZERO);
            let _ = write!(reply, "\n{category}: {}", self.money(spent));
        }
        let total: Amount = totals.values().copied().sum();
        let _ = write!(reply, "\nTotal: {}", self.money(total));
        Ok(reply)
    }

    async fn budget(&self, month: Month) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let progress = self.budgets.progress(&user_id, month).await?;
        if progress.is_empty() {
            return Ok(format!("No budget set for {month}. Use /setbudget to create one."));
        }

        let mut reply = format!("🎯 Budget for {month}");
        for entry in progress {
            let _ = write!(
                reply,
                "\n{}: {} / {} ({})",
                entry.category,
                self.money(entry.spent),
                self.money(entry.limit),
                Formatter::format_percentage(entry.percentage)
            );
        }
        Ok(reply)
    }

    async fn set_budget(&self, limits: &BudgetLimits) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let budget = self.budgets.set_current_budget(&user_id, limits).await?;
        Ok(format!(
            "✅ Budget for {} saved, total {}",
            budget.month,
            self.money(budget.limits.total())
        ))
    }

    async fn home(&self) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let summary = self.summary.home(&user_id).await?;

        let mut reply = format!(
            "🏠 Balance: {}\nThis month: {} of {}\n🔔 Unread notifications: {}",
            self.money(summary.balance),
            self.money(summary.monthly_spent),
            self.money(summary.monthly_limit),
            summary.unread_notifications
        );
        for transaction in &summary.recent_transactions {
            let _ = write!(
                reply,
                "\n• {} {} {}",
                transaction.date,
                destination_name(transaction),
                self.money(transaction.amount)
            );
        }
        Ok(reply)
    }

    async fn notifications(&self, unread_only: bool) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        let filter = unread_only.then_some(false);
        let notifications = self.db.list_notifications(&user_id, filter).await?;

        if notifications.is_empty() {
            return Ok("No notifications".to_string());
        }

        let mut reply = String::from("🔔 Notifications");
        for notification in notifications {
            let marker = if notification.read_status { " " } else { "*" };
            let _ = write!(
                reply,
                "\n{marker} #{} {}: {}",
                notification.id, notification.title, notification.message
            );
        }
        Ok(reply)
    }

    async fn read(&self, notification_id: Option<i64>) -> Result<String> {
        let user_id = self.session.current_user_id().await?;
        match notification_id {
            Some(id) => {
                self.db.mark_read(&user_id, id).await?;
                Ok(format!("✅ Notification #{id} marked as read"))
            }
            None => {
                let changed = self.db.mark_all_read(&user_id).await?;
                Ok(format!("✅ Marked {changed} notification(s) as read"))
            }
        }
    }
}

fn destination_name(transaction: &Transaction) -> String {
    match (&transaction.category, &transaction.detail) {
        (Category::Other, Some(detail)) => detail.clone(),
        (category, _) => category.to_string(),
    }
}
