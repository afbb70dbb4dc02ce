use log::{debug, warn};
use std::sync::Arc;

use crate::ledger::traits::ProfileStore;

/// Single-factor check run before a payment reaches the coordinator.
///
/// There is no attempt counting or lockout.
#[derive(Clone)]
pub struct PinGate {
    profiles: Arc<dyn ProfileStore>,
}

impl PinGate {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Any failure to load the profile counts as a mismatch.
    pub async fn verify(&self, user_id: &str, entered_pin: &str) -> bool {
        match self.profiles.get_profile(user_id).await {
            Ok(profile) => {
                let matched = profile.pin.trim() == entered_pin.trim();
                debug!("PIN verification for {user_id}: {}", if matched { "pass" } else { "fail" });
                matched
            }
            Err(e) => {
                warn!("PIN verification for {user_id} failed to load profile: {e}");
                false
            }
        }
    }
}
