use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::amount::Amount;
use crate::database::models::{Direction, Wallet};
use crate::database::operations::DatabaseOperations;
use crate::error::{LedgerError, Result};
use crate::ledger::traits::WalletStore;
use crate::utils::Logger;

#[async_trait]
impl WalletStore for DatabaseOperations {
    async fn get_balance(&self, user_id: &str) -> Result<Wallet> {
        let conn = self.conn.lock().await;
        find_wallet(&conn, user_id)?.ok_or_else(|| LedgerError::wallet_not_found(user_id))
    }

    async fn adjust_balance(
        &self,
        user_id: &str,
        delta: Amount,
        direction: Direction,
    ) -> Result<Wallet> {
        if delta.cents() <= 0 {
            return Err(LedgerError::invalid_amount(format!(
                "{delta} is not a positive adjustment"
            )));
        }

        let signed = match direction {
            Direction::Credit => delta.cents(),
            Direction::Debit => -delta.cents(),
        };

        let conn = self.conn.lock().await;

        // Single conditional statement: the bounds check and the write cannot interleave
        // with another adjustment of the same row.
        let updated = conn
            .query_row(
                "UPDATE wallets
                 SET balance_cents = balance_cents + ?1, updated_at = ?2
                 WHERE user_id = ?3
                   AND balance_cents + ?1 >= 0
                   AND balance_cents + ?1 <= ?4
                 RETURNING id, user_id, balance_cents, created_at, updated_at",
                params![signed, Utc::now(), user_id, Amount::MAX.cents()],
                wallet_from_row,
            )
            .optional()?;

        if let Some(wallet) = updated {
            let old_balance = Amount::from_cents(wallet.balance.cents() - signed);
            Logger::log_balance_update(user_id, direction, delta, old_balance, wallet.balance);
            return Ok(wallet);
        }

        match find_wallet(&conn, user_id)? {
            None => Err(LedgerError::wallet_not_found(user_id)),
            Some(wallet) if direction == Direction::Debit => Err(LedgerError::InsufficientFunds {
                available: wallet.balance,
                requested: delta,
            }),
            Some(wallet) => Err(LedgerError::invalid_amount(format!(
                "crediting {delta} to {} exceeds the maximum balance of {}",
                wallet.balance,
                Amount::MAX
            ))),
        }
    }
}

fn find_wallet(conn: &Connection, user_id: &str) -> Result<Option<Wallet>> {
    let wallet = conn
        .query_row(
            "SELECT id, user_id, balance_cents, created_at, updated_at FROM wallets WHERE user_id = ?1",
            params![user_id],
            wallet_from_row,
        )
        .optional()?;
    Ok(wallet)
}

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<Wallet> {
    Ok(Wallet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        balance: Amount::from_cents(row.get(2)?),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
