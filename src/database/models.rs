use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: String,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Credit => Direction::Debit,
            Direction::Debit => Direction::Credit,
        }
    }

    /// Column value; the store keeps the `income` / `expense` vocabulary.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Credit => "income",
            Direction::Debit => "expense",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => write!(f, "credit"),
            Direction::Debit => write!(f, "debit"),
        }
    }
}

impl FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" => Ok(Direction::Credit),
            "expense" | "debit" => Ok(Direction::Debit),
            other => Err(LedgerError::invalid_input(format!(
                "unknown transaction direction '{other}'"
            ))),
        }
    }
}

/// Spending destination of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Canteen,
    Library,
    Lab,
    Club,
    Other,
    TopUp,
}

impl Category {
    /// Destinations a budget can limit, in display order.
    pub const SPENDING: [Category; 5] = [
        Category::Canteen,
        Category::Library,
        Category::Lab,
        Category::Club,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Canteen => "canteen",
            Category::Library => "library",
            Category::Lab => "lab",
            Category::Club => "club",
            Category::Other => "other",
            Category::TopUp => "topup",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Canteen => "Canteen",
            Category::Library => "Library",
            Category::Lab => "Lab",
            Category::Club => "Club",
            Category::Other => "Other",
            Category::TopUp => "Top-up",
        }
    }

    /// Resolve free text to a category; anything unknown is `Other` and the
    /// text is returned as the detail.
    pub fn resolve(text: &str) -> (Category, Option<String>) {
        match text.parse::<Category>() {
            Ok(category) => (category, None),
            Err(_) => {
                let detail = text.trim();
                let detail = (!detail.is_empty()).then(|| detail.to_string());
                (Category::Other, detail)
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canteen" => Ok(Category::Canteen),
            "library" => Ok(Category::Library),
            "lab" => Ok(Category::Lab),
            "club" => Ok(Category::Club),
            "other" => Ok(Category::Other),
            "topup" | "top-up" => Ok(Category::TopUp),
            other => Err(LedgerError::invalid_input(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    /// Card top-up awaiting the payment processor's confirmation.
    Pending,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransactionStatus::Completed),
            "pending" => Ok(TransactionStatus::Pending),
            other => Err(LedgerError::invalid_input(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub amount: Amount,
    pub direction: Direction,
    pub category: Category,
    /// Free text entered for the `Other` destination.
    pub detail: Option<String>,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub external_ref: Option<String>,
    pub status: TransactionStatus,
}

/// Input of the transaction recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub direction: Direction,
    pub category: Category,
    pub detail: Option<String>,
    pub description: String,
    /// Defaults to today's date when absent.
    pub date: Option<NaiveDate>,
    pub external_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category: Option<Category>,
    pub direction: Option<Direction>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TransactionFilter {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn month(month: Month) -> Self {
        Self {
            from: Some(month.first_day()),
            to: Some(month.last_day()),
            ..Self::default()
        }
    }
}

/// Calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
            .map(Self::of)
            .map_err(|_| LedgerError::invalid_input(format!("'{text}' is not a YYYY-MM month")))
    }
}

impl Serialize for Month {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-category spending limits for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BudgetLimits {
    pub canteen: Amount,
    pub library: Amount,
    pub lab: Amount,
    pub club: Amount,
    pub other: Amount,
}

impl BudgetLimits {
    pub fn limit_for(&self, category: Category) -> Amount {
        match category {
            Category::Canteen => self.canteen,
            Category::Library => self.library,
            Category::Lab => self.lab,
            Category::Club => self.club,
            Category::Other => self.other,
            Category::TopUp => Amount::ZERO,
        }
    }

    pub fn set(&mut self, category: Category, limit: Amount) {
        match category {
            Category::Canteen => self.canteen = limit,
            Category::Library => self.library = limit,
            Category::Lab => self.lab = limit,
            Category::Club => self.club = limit,
            Category::Other => self.other = limit,
            Category::TopUp => {}
        }
    }

    pub fn total(&self) -> Amount {
        Category::SPENDING.iter().map(|c| self.limit_for(*c)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub month: Month,
    pub limits: BudgetLimits,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub category: Category,
    pub spent: Amount,
    pub limit: Amount,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Transaction,
    BudgetAlert,
    FriendRequest,
    MoneyRequest,
    System,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Transaction => "transaction",
            NotificationKind::BudgetAlert => "budget_alert",
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::MoneyRequest => "money_request",
            NotificationKind::System => "system",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(NotificationKind::Transaction),
            "budget_alert" => Ok(NotificationKind::BudgetAlert),
            "friend_request" => Ok(NotificationKind::FriendRequest),
            "money_request" => Ok(NotificationKind::MoneyRequest),
            "system" => Ok(NotificationKind::System),
            other => Err(LedgerError::invalid_input(format!(
                "unknown notification type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_entity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read_status: bool,
    pub related_entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub student_id: String,
    pub contact_number: String,
    #[serde(skip_serializing)]
    pub pin: String,
    pub created_at: DateTime<Utc>,
}

/// Registration payload; creates the profile and its empty wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub student_id: String,
    pub contact_number: String,
    pub pin: String,
}

/// Figures shown on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub balance: Amount,
    pub monthly_spent: Amount,
    pub monthly_limit: Amount,
    pub recent_transactions: Vec<Transaction>,
    pub unread_notifications: u64,
}
