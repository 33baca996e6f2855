use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::catalog::TokenExchange;
use crate::error::{EmotuneError, Result};

/// Default refresh margin before the provider-reported expiry.
pub const DEFAULT_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound on a cached lifetime; provider values beyond it are clamped.
const MAX_LIFETIME: Duration = Duration::from_secs(u32::MAX as u64);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Empty,
    Valid,
    Expired,
}

/// Process-wide cache for the client-credentials access token.
///
/// Refreshes are single-flight: the slot lock is held across the exchange,
/// so concurrent callers that find the token stale wait for the one refresh
/// in progress and then reuse its result.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    margin: Duration,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self::with_margin(exchange, DEFAULT_MARGIN)
    }

    pub fn with_margin(exchange: Arc<dyn TokenExchange>, margin: Duration) -> Self {
        Self { exchange, margin, slot: Mutex::new(None) }
    }

    /// A token valid for at least the refresh margin, exchanging credentials
    /// only when none is cached or the cached one is stale. A failed exchange
    /// leaves the cached state untouched.
    pub fn get_token(&self) -> Result<String> {
        let mut slot = self.slot.lock();
        if let Some(token) = slot.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
            debug!("Access token expired, refreshing");
        }

        let grant = self.exchange.exchange().map_err(|e| {
            warn!("Token exchange failed: {}", e);
            EmotuneError::AuthUnavailable(e)
        })?;
        let ttl = Duration::from_secs(grant.expires_in).saturating_sub(self.margin).min(MAX_LIFETIME);
        info!("Obtained access token (valid for {}s)", grant.expires_in);
        let now = Instant::now();
        // An unrepresentable deadline leaves the token stale rather than panicking.
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        *slot = Some(AccessToken { value: grant.access_token.clone(), expires_at });
        Ok(grant.access_token)
    }

    pub fn status(&self) -> TokenStatus {
        match self.slot.lock().as_ref() {
            None => TokenStatus::Empty,
            Some(t) if Instant::now() < t.expires_at => TokenStatus::Valid,
            Some(_) => TokenStatus::Expired,
        }
    }
}
