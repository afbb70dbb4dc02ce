use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use std::collections::BTreeMap;

use crate::amount::Amount;
use crate::database::models::{
    Category, Month, NewTransaction, Transaction, TransactionFilter, TransactionStatus,
};
use crate::database::operations::{parse_column, DatabaseOperations};
use crate::error::{LedgerError, Result};
use crate::ledger::traits::TransactionRecorder;

const TRANSACTION_COLUMNS: &str = "id, user_id, amount_cents, type, category, detail, description, \
     date, created_at, external_ref, status";

#[async_trait]
impl TransactionRecorder for DatabaseOperations {
    async fn record(&self, user_id: &str, entry: &NewTransaction) -> Result<Transaction> {
        if entry.amount.cents() <= 0 {
            return Err(LedgerError::invalid_amount(format!(
                "{} is not a positive amount",
                entry.amount
            )));
        }

        let now = Utc::now();
        let date = entry.date.unwrap_or_else(|| now.date_naive());
        let status = if entry.external_ref.is_some() {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Completed
        };

        let conn = self.conn.lock().await;
        let transaction = conn.query_row(
            &format!(
                "INSERT INTO transactions
                    (user_id, amount_cents, type, category, detail, description, date, created_at, external_ref, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 RETURNING {TRANSACTION_COLUMNS}"
            ),
            params![
                user_id,
                entry.amount.cents(),
                entry.direction.as_str(),
                entry.category.as_str(),
                entry.detail,
                entry.description,
                date,
                now,
                entry.external_ref,
                status.as_str()
            ],
            transaction_from_row,
        )?;

        debug!(
            "Recorded transaction {}: {} {} {}",
            transaction.id, user_id, transaction.direction, transaction.amount
        );
        Ok(transaction)
    }

    async fn list(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ?");
        let mut values = vec![Value::Text(user_id.to_string())];

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(direction) = filter.direction {
            sql.push_str(" AND type = ?");
            values.push(Value::Text(direction.as_str().to_string()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND date >= ?");
            values.push(Value::Text(from.format("%F").to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND date <= ?");
            values.push(Value::Text(to.format("%F").to_string()));
        }

        sql.push_str(" ORDER BY date DESC, created_at DESC, id DESC");

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (filter.limit, filter.offset) {
            (None, None) => {}
            (limit, offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                values.push(Value::Integer(limit.map_or(-1, |l| l as i64)));
                values.push(Value::Integer(offset.unwrap_or(0) as i64));
            }
        }

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), transaction_from_row)?;
        let transactions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(transactions)
    }

    async fn count_for(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn sum_by_category(
        &self,
        user_id: &str,
        month: Month,
    ) -> Result<BTreeMap<Category, Amount>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT category, SUM(amount_cents) FROM transactions
             WHERE user_id = ?1 AND type = 'expense' AND date >= ?2 AND date <= ?3
             GROUP BY category",
        )?;
        let rows = stmt.query_map(
            params![user_id, month.first_day(), month.last_day()],
            |row| {
                let category: Category = parse_column(row, 0)?;
                let total: i64 = row.get(1)?;
                Ok((category, Amount::from_cents(total)))
            },
        )?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let (category, total) = row?;
            *totals.entry(category).or_insert(Amount::ZERO) += total;
        }
        Ok(totals)
    }
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: Amount::from_cents(row.get(2)?),
        direction: parse_column(row, 3)?,
        category: parse_column(row, 4)?,
        detail: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        external_ref: row.get(9)?,
        status: parse_column::<TransactionStatus>(row, 10)?,
    })
}
