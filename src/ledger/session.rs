use async_trait::async_trait;
use log::info;
use tokio::sync::RwLock;

use crate::error::{LedgerError, Result};
use crate::ledger::traits::SessionProvider;

/// In-process session holding at most one signed-in user.
#[derive(Debug, Default)]
pub struct StaticSession {
    user_id: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub async fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!("Signed in as {user_id}");
        *self.user_id.write().await = Some(user_id);
    }

    pub async fn sign_out(&self) {
        if let Some(user_id) = self.user_id.write().await.take() {
            info!("Signed out {user_id}");
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_user_id(&self) -> Result<String> {
        self.user_id
            .read()
            .await
            .clone()
            .ok_or(LedgerError::Unauthenticated)
    }
}
