use log::{debug, info};
use std::sync::Arc;

use crate::amount::Amount;
use crate::database::models::{Budget, BudgetLimits, BudgetProgress, Category, Month};
use crate::error::{LedgerError, Result};
use crate::ledger::traits::{BudgetStore, TransactionRecorder};

/// Read-only budget derivations over the transaction log.
#[derive(Clone)]
pub struct BudgetCalculator {
    budgets: Arc<dyn BudgetStore>,
    recorder: Arc<dyn TransactionRecorder>,
}

impl BudgetCalculator {
    pub fn new(budgets: Arc<dyn BudgetStore>, recorder: Arc<dyn TransactionRecorder>) -> Self {
        Self { budgets, recorder }
    }

    /// Budgets can only be set for the current month.
    pub async fn set_current_budget(&self, user_id: &str, limits: &BudgetLimits) -> Result<Budget> {
        if let Some(category) = Category::SPENDING
            .into_iter()
            .find(|category| limits.limit_for(*category).cents() < 0)
        {
            return Err(LedgerError::invalid_amount(format!(
                "{category} limit cannot be negative"
            )));
        }

        let month = Month::current();
        let budget = self.budgets.upsert_budget(user_id, month, limits).await?;
        info!("Budget for {user_id} set for {month}");
        Ok(budget)
    }

    /// Spend against limit for the five spending categories, in display order.
    /// Empty when no budget exists for the month.
    pub async fn progress(&self, user_id: &str, month: Month) -> Result<Vec<BudgetProgress>> {
        let Some(budget) = self.budgets.get_budget(user_id, month).await? else {
            debug!("No budget for {user_id} in {month}");
            return Ok(Vec::new());
        };

        let spent = self.recorder.sum_by_category(user_id, month).await?;

        Ok(Category::SPENDING
            .into_iter()
            .map(|category| {
                let spent = spent.get(&category).copied().unwrap_or(Amount::ZERO);
                let limit = budget.limits.limit_for(category);
                BudgetProgress {
                    category,
                    spent,
                    limit,
                    percentage: percentage_used(spent, limit),
                }
            })
            .collect())
    }

    /// Sum of the five limits; zero when no budget exists.
    pub async fn monthly_limit(&self, user_id: &str, month: Month) -> Result<Amount> {
        Ok(self
            .budgets
            .get_budget(user_id, month)
            .await?
            .map(|budget| budget.limits.total())
            .unwrap_or(Amount::ZERO))
    }
}

/// `spent / limit * 100`, or 0 for an unset limit.
pub fn percentage_used(spent: Amount, limit: Amount) -> f64 {
    if limit.cents() <= 0 {
        return 0.0;
    }
    spent.cents() as f64 / limit.cents() as f64 * 100.0
}
