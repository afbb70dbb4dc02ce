use async_trait::async_trait;
use chrono::Utc;
use log::info;
use rusqlite::{params, OptionalExtension, Row};

use crate::amount::Amount;
use crate::database::models::{Budget, BudgetLimits, Month};
use crate::database::operations::{parse_column, DatabaseOperations};
use crate::error::Result;
use crate::ledger::traits::BudgetStore;

const BUDGET_COLUMNS: &str = "id, user_id, month, canteen_cents, library_cents, lab_cents, \
     club_cents, other_cents, created_at";

#[async_trait]
impl BudgetStore for DatabaseOperations {
    async fn upsert_budget(
        &self,
        user_id: &str,
        month: Month,
        limits: &BudgetLimits,
    ) -> Result<Budget> {
        let conn = self.conn.lock().await;
        let budget = conn.query_row(
            &format!(
                "INSERT INTO budgets
                    (user_id, month, canteen_cents, library_cents, lab_cents, club_cents, other_cents, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT (user_id, month) DO UPDATE SET
                    canteen_cents = excluded.canteen_cents,
                    library_cents = excluded.library_cents,
                    lab_cents = excluded.lab_cents,
                    club_cents = excluded.club_cents,
                    other_cents = excluded.other_cents,
                    updated_at = excluded.updated_at
                 RETURNING {BUDGET_COLUMNS}"
            ),
            params![
                user_id,
                month.to_string(),
                limits.canteen.cents(),
                limits.library.cents(),
                limits.lab.cents(),
                limits.club.cents(),
                limits.other.cents(),
                Utc::now()
            ],
            budget_from_row,
        )?;

        info!("Saved budget for {user_id} ({month}): total {}", limits.total());
        Ok(budget)
    }

    async fn get_budget(&self, user_id: &str, month: Month) -> Result<Option<Budget>> {
        let conn = self.conn.lock().await;
        let budget = conn
            .query_row(
                &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE user_id = ?1 AND month = ?2"),
                params![user_id, month.to_string()],
                budget_from_row,
            )
            .optional()?;
        Ok(budget)
    }
}

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        month: parse_column(row, 2)?,
        limits: BudgetLimits {
            canteen: Amount::from_cents(row.get(3)?),
            library: Amount::from_cents(row.get(4)?),
            lab: Amount::from_cents(row.get(5)?),
            club: Amount::from_cents(row.get(6)?),
            other: Amount::from_cents(row.get(7)?),
        },
        created_at: row.get(8)?,
    })
}
