//! User lookup service.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LookupError;
use crate::metrics::MetricsCollector;
use crate::service::CooldownLimiter;
use crate::storage::Database;

/// Rate-limited, validated access to the active `Database`.
pub struct UserLookupService {
    db: Arc<dyn Database>,
    metrics: Arc<MetricsCollector>,
    /// `None` when rate limiting is switched off
    limiter: Option<CooldownLimiter>,
}

impl UserLookupService {
    pub fn new(db: Arc<dyn Database>, metrics: Arc<MetricsCollector>, rate_limiting: bool) -> Self {
        Self {
            db,
            metrics,
            limiter: rate_limiting.then(CooldownLimiter::default),
        }
    }

    pub fn from_config(db: Arc<dyn Database>, metrics: Arc<MetricsCollector>, config: &Config) -> Self {
        Self::new(db, metrics, config.app.features.rate_limiting)
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Looks up the name for `id`.
    ///
    /// Checks, in order: the global cooldown, then that an id was supplied.
    /// Neither rejection reaches the database or the lookup counter.
    pub async fn lookup(
        &self,
        id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, LookupError> {
        if let Some(limiter) = &self.limiter {
            if !limiter.try_acquire() {
                warn!(component = "USER", "Rate limit exceeded");
                return Err(LookupError::RateLimited);
            }
        }

        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => {
                warn!(component = "USER", "Missing user ID in request");
                return Err(LookupError::MissingId);
            }
        };

        self.metrics.record_user_lookup();

        match self.db.get_user(id, cancel).await {
            Ok(name) => {
                info!(component = "USER", "Successfully fetched user: {}", name);
                Ok(name)
            }
            Err(e) => {
                warn!(component = "USER", "Error fetching user: {}", e);
                Err(e.into())
            }
        }
    }
}
