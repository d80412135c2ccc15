use crate::config::TrialConfig;
use crate::entities::SubscriptionStatus;
use crate::error::{AppError, AppResult};
use crate::models::{DenialReason, UsageDecision, UsageKind, UsageSummaryResponse};
use crate::store::{Subscription, SubscriptionStore};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identity used when a caller sends none. Every anonymous caller shares
/// this one record and therefore one quota.
pub const GUEST_IDENTITY: &str = "guest@example.com";

const DEFAULT_STORE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Trial and usage bookkeeping over a [`SubscriptionStore`].
///
/// Checking and recording are separate calls: endpoints check, perform the
/// action, then record it. Two concurrent requests may both pass the check
/// and push a counter one past its limit.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn SubscriptionStore>,
    trial: TrialConfig,
    store_timeout: StdDuration,
}

impl LedgerService {
    pub fn new(store: Arc<dyn SubscriptionStore>, trial: TrialConfig) -> Self {
        Self {
            store,
            trial,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Deadline for each store round trip. A call that overruns it is
    /// reported as `StorageUnavailable`.
    pub fn with_store_timeout(mut self, timeout: StdDuration) -> Self {
        self.store_timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        op: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::storage(format!(
                "{op} timed out after {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }

    /// Fresh trial record for `identity` starting at `now`.
    pub fn new_trial_record(&self, identity: &str, now: DateTime<Utc>) -> Subscription {
        // Postgres keeps microseconds; truncate so the returned record matches what is stored
        let now = now.trunc_subsecs(6);
        Subscription {
            id: Uuid::new_v4(),
            user_email: identity.to_string(),
            stripe_customer_id: None,
            subscription_status: SubscriptionStatus::Trial,
            trial_start_date: now,
            trial_end_date: now + Duration::days(self.trial.duration_days),
            subscription_start_date: None,
            messages_used: 0,
            images_used: 0,
            message_limit: self.trial.message_limit,
            image_limit: self.trial.image_limit,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the record for `identity`, creating a trial on first sight.
    /// A create that loses to a concurrent create returns the winner's record.
    pub async fn get_or_create(&self, identity: &str) -> AppResult<Subscription> {
        if let Some(existing) = self.bounded("find", self.store.find(identity)).await? {
            return Ok(existing);
        }

        let record = self.new_trial_record(identity, Utc::now());
        match self
            .bounded("insert", self.store.insert_if_absent(record))
            .await?
        {
            Some(created) => {
                log::info!(
                    "Started trial for {identity}, ends {}",
                    created.trial_end_date.to_rfc3339()
                );
                Ok(created)
            }
            None => self
                .bounded("find", self.store.find(identity))
                .await?
                .ok_or_else(|| {
                    AppError::storage(format!(
                        "subscription for {identity} missing after concurrent create"
                    ))
                }),
        }
    }

    /// Decision rules for one record at instant `now`. Trial rules apply
    /// only while the record is on trial.
    pub fn evaluate(subscription: Subscription, kind: UsageKind, now: DateTime<Utc>) -> UsageDecision {
        let status = subscription.subscription_status;
        match status {
            SubscriptionStatus::Trial if now > subscription.trial_end_date => {
                UsageDecision::deny(subscription, DenialReason::TrialExpired)
            }
            SubscriptionStatus::Inactive | SubscriptionStatus::Expired => {
                UsageDecision::deny(subscription, DenialReason::SubscriptionInactive)
            }
            SubscriptionStatus::Trial if kind.used(&subscription) >= kind.limit(&subscription) => {
                let limit = kind.limit(&subscription);
                UsageDecision::deny(subscription, DenialReason::LimitReached { kind, limit })
            }
            SubscriptionStatus::Active | SubscriptionStatus::Trial => {
                UsageDecision::allow(subscription)
            }
        }
    }

    /// May `identity` perform one action of `kind` now? Never mutates
    /// counters. If the store is unreachable the answer is yes.
    pub async fn check_limit(&self, identity: &str, kind: UsageKind) -> UsageDecision {
        self.check_limit_at(identity, kind, Utc::now()).await
    }

    pub async fn check_limit_at(
        &self,
        identity: &str,
        kind: UsageKind,
        now: DateTime<Utc>,
    ) -> UsageDecision {
        match self.get_or_create(identity).await {
            Ok(subscription) => {
                let decision = Self::evaluate(subscription, kind, now);
                if let Some(reason) = &decision.reason {
                    log::info!("Denied {kind} for {identity}: {reason}");
                }
                decision
            }
            Err(e) => {
                log::warn!("Usage check for {identity} failed open: {e}");
                UsageDecision::fail_open()
            }
        }
    }

    /// Records one action of `kind`. Returns whether a write landed; errors
    /// are logged here and never reach the caller.
    pub async fn increment(&self, identity: &str, kind: UsageKind) -> bool {
        match self
            .bounded("increment", self.store.increment_usage(identity, kind))
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                log::warn!("No subscription for {identity}, {kind} usage not recorded");
                false
            }
            Err(e) => {
                log::warn!("Atomic {kind} increment for {identity} failed: {e}; retrying as read-modify-write");
                match self.increment_read_modify_write(identity, kind).await {
                    Ok(written) => written,
                    Err(e) => {
                        let err = AppError::IncrementFailed(format!("{identity}/{kind}: {e}"));
                        log::error!("{err}");
                        false
                    }
                }
            }
        }
    }

    // Best effort only: two racing writers can both read N and both write N + 1.
    async fn increment_read_modify_write(&self, identity: &str, kind: UsageKind) -> AppResult<bool> {
        let Some(current) = self.bounded("find", self.store.find(identity)).await? else {
            return Ok(false);
        };
        self.bounded(
            "raise",
            self.store
                .raise_usage(identity, kind, kind.used(&current) + 1),
        )
        .await
    }

    /// Runs [`Self::increment`] as a detached task so the response does not
    /// wait on the write.
    pub fn spawn_increment(&self, identity: String, kind: UsageKind) -> JoinHandle<bool> {
        let ledger = self.clone();
        tokio::spawn(async move { ledger.increment(&identity, kind).await })
    }

    pub async fn usage_summary(&self, identity: &str) -> AppResult<UsageSummaryResponse> {
        let subscription = self.get_or_create(identity).await?;
        Ok(Self::summarize(subscription, Utc::now()))
    }

    pub fn summarize(subscription: Subscription, now: DateTime<Utc>) -> UsageSummaryResponse {
        let on_trial = subscription.subscription_status == SubscriptionStatus::Trial;
        let remaining = |kind: UsageKind| {
            on_trial.then(|| (kind.limit(&subscription) - kind.used(&subscription)).max(0))
        };
        let messages_remaining = remaining(UsageKind::Message);
        let images_remaining = remaining(UsageKind::Image);
        let trial_days_left = on_trial.then(|| {
            let secs = (subscription.trial_end_date - now).num_seconds().max(0);
            (secs + 86_399) / 86_400
        });

        UsageSummaryResponse {
            subscription: subscription.into(),
            messages_remaining,
            images_remaining,
            trial_days_left,
        }
    }
}
