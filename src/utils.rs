use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::amount::Amount;
use crate::database::models::{Direction, NewUser};
use crate::error::{LedgerError, Result};
use crate::parser::RegexPatterns;

/// Uniform log lines for ledger operations.
pub struct Logger;

impl Logger {
    pub fn log_operation_start(operation: &str, details: &str) {
        info!("🚀 Starting {}: {}", operation, details);
    }

    pub fn log_operation_success(operation: &str, details: &str) {
        info!("✅ {} completed successfully: {}", operation, details);
    }

    pub fn log_operation_failure(operation: &str, error: &str) {
        error!("❌ {} failed: {}", operation, error);
    }

    pub fn log_operation_rejected(operation: &str, reason: &str) {
        warn!("⚠️ {} rejected: {}", operation, reason);
    }

    pub fn log_balance_update(
        user_id: &str,
        direction: Direction,
        amount: Amount,
        old_balance: Amount,
        new_balance: Amount,
    ) {
        info!(
            "💰 Balance Update: {} | {} {} | {} → {}",
            user_id, direction, amount, old_balance, new_balance
        );
    }
}

pub struct Formatter;

impl Formatter {
    pub fn format_amount(symbol: &str, amount: Amount) -> String {
        format!("{symbol}{amount}")
    }

    pub fn format_percentage(percentage: f64) -> String {
        format!("{percentage:.1}%")
    }

    pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
        timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Registration field checks.
pub struct Validator;

impl Validator {
    pub fn is_valid_pin(pin: &str) -> bool {
        RegexPatterns::get_instance().pin_regex.is_match(pin)
    }

    pub fn is_valid_student_id(student_id: &str) -> bool {
        RegexPatterns::get_instance().student_id_regex.is_match(student_id)
    }

    pub fn is_valid_contact_number(contact_number: &str) -> bool {
        RegexPatterns::get_instance()
            .contact_number_regex
            .is_match(contact_number)
    }

    pub fn is_valid_username(username: &str) -> bool {
        let username = username.trim();
        !username.is_empty() && username.len() <= 50 && !username.contains(char::is_whitespace)
    }

    pub fn validate_new_user(new_user: &NewUser) -> Result<()> {
        if !Self::is_valid_username(&new_user.username) {
            return Err(LedgerError::invalid_input(
                "Username must be 1-50 characters without spaces",
            ));
        }
        if new_user.full_name.trim().is_empty() {
            return Err(LedgerError::invalid_input("Full name cannot be empty"));
        }
        if !Self::is_valid_student_id(&new_user.student_id) {
            return Err(LedgerError::invalid_input(
                "Student ID must be exactly 9 digits",
            ));
        }
        if !Self::is_valid_pin(&new_user.pin) {
            return Err(LedgerError::invalid_input("PIN must be exactly 5 digits"));
        }
        if !Self::is_valid_contact_number(&new_user.contact_number) {
            return Err(LedgerError::invalid_input(
                "Contact number must contain only digits",
            ));
        }
        Ok(())
    }
}
