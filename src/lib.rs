pub mod amount;
pub mod calculator;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod retry;
pub mod shell;
pub mod utils;

pub use amount::Amount;
pub use calculator::{BudgetCalculator, SummaryCalculator};
pub use config::Settings;
pub use database::{models, DatabaseOperations};
pub use error::{LedgerError, Result};
pub use ledger::{LedgerCoordinator, LedgerRequest, PaymentFlow, PaymentOutcome, PinGate, StaticSession};
pub use parser::InputParser;
pub use shell::ShellHandler;
