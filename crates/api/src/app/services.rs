use chrono::Duration;
use tokio::sync::Mutex;

use dreambook_auth::TokenService;
use dreambook_infra::Stores;
use dreambook_infra::config::{DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS};

/// Shared state behind every handler.
pub struct AppServices {
    pub stores: Stores,
    pub tokens: TokenService,
    /// Serializes availability check-then-insert and reservation state changes.
    pub booking_lock: Mutex<()>,
    /// Serializes username/email uniqueness checks with account writes.
    pub accounts_lock: Mutex<()>,
    /// Held across every advertisement read-modify-write, view counting included.
    pub advertisements_lock: Mutex<()>,
}

impl AppServices {
    pub fn new(stores: Stores, tokens: TokenService) -> Self {
        Self {
            stores,
            tokens,
            booking_lock: Mutex::new(()),
            accounts_lock: Mutex::new(()),
            advertisements_lock: Mutex::new(()),
        }
    }

    /// In-memory stores and default token lifetimes.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(
            Stores::in_memory(),
            TokenService::new(
                jwt_secret,
                Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
                Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            ),
        )
    }
}
