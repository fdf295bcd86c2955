use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::errors::RateLimitError;
use crate::application::ports::{BucketStore, Clock};
use crate::domain::entities::{Admission, ThrottleLimits};
use crate::domain::value_objects::ClientIdentity;

/// Whether admission checks are enforced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottlePolicy {
    Enforced(ThrottleLimits),
    /// Every request is admitted and no bucket is touched
    Disabled,
}

/// Token-bucket admission control keyed by hashed client identity
pub struct RateLimiter {
    store: Arc<dyn BucketStore>,
    policy: ThrottlePolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn BucketStore>, policy: ThrottlePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    /// Admit or deny one request from `client`
    pub async fn admit(&self, client: &ClientIdentity) -> Result<(), RateLimitError> {
        let limits = match self.policy {
            ThrottlePolicy::Enforced(limits) => limits,
            ThrottlePolicy::Disabled => return Ok(()),
        };

        let now = self.clock.unix_seconds();
        let decision = self.store.check(client.hashed(), &limits, now).await?;
        let allowance = (decision.bucket.allowance() * 10.0).round() / 10.0;

        match decision.admission {
            Admission::Admitted => {
                debug!(client = %client, allowance, "Allow");
                Ok(())
            }
            Admission::Denied => {
                warn!(
                    client = %client,
                    allowance,
                    throttle_count = decision.bucket.throttle_count(),
                    "Deny"
                );
                Err(RateLimitError::Exceeded {
                    rate: limits.rate,
                    per_secs: limits.per.as_secs(),
                })
            }
        }
    }
}
