use log::{info, warn};
use std::sync::Arc;

use crate::database::models::{Category, Transaction};
use crate::error::{LedgerError, Result};
use crate::ledger::coordinator::{LedgerCoordinator, LedgerRequest};
use crate::ledger::pin::PinGate;
use crate::ledger::traits::SessionProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Completed(Transaction),
    /// Wrong PIN or no profile; the caller should prompt again.
    PinRejected,
}

/// Confirmation step of the pay and top-up screens.
#[derive(Clone)]
pub struct PaymentFlow {
    session: Arc<dyn SessionProvider>,
    gate: PinGate,
    coordinator: LedgerCoordinator,
}

impl PaymentFlow {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        gate: PinGate,
        coordinator: LedgerCoordinator,
    ) -> Self {
        Self {
            session,
            gate,
            coordinator,
        }
    }

    /// Debit the signed-in user after the PIN gate passes.
    ///
    /// `destination` is a category name; unknown text pays into `Other` and
    /// is kept as the transaction detail.
    pub async fn confirm_payment(
        &self,
        pin: &str,
        destination: &str,
        amount: f64,
        description: &str,
    ) -> Result<PaymentOutcome> {
        let (category, detail) = Category::resolve(destination);
        if category == Category::TopUp {
            return Err(LedgerError::invalid_input(
                "top-up is not a payment destination",
            ));
        }

        let user_id = match self.session.current_user_id().await {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!("Payment PIN check without a session: {e}");
                return Ok(PaymentOutcome::PinRejected);
            }
        };

        if !self.gate.verify(&user_id, pin).await {
            info!("Payment by {user_id} stopped at the PIN gate");
            return Ok(PaymentOutcome::PinRejected);
        }

        let description = if description.trim().is_empty() {
            format!("Payment to {}", detail.as_deref().unwrap_or(category.display_name()))
        } else {
            description.trim().to_string()
        };

        let request = LedgerRequest::payment(amount, category, detail, description);
        let transaction = self.coordinator.execute_for(&user_id, request).await?;
        Ok(PaymentOutcome::Completed(transaction))
    }

    /// Credit the signed-in user. Top-ups skip the PIN gate.
    pub async fn confirm_top_up(
        &self,
        amount: f64,
        external_ref: Option<String>,
    ) -> Result<Transaction> {
        let external_ref = external_ref
            .map(|reference| reference.trim().to_string())
            .filter(|reference| !reference.is_empty());
        self.coordinator
            .execute(LedgerRequest::top_up(amount, external_ref))
            .await
    }
}
