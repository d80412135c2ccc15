use crate::entities::{SubscriptionStatus, subscription_entity as sub};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metered action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Message,
    Image,
}

impl UsageKind {
    /// Plural noun used in quota messages.
    pub fn label(&self) -> &'static str {
        match self {
            UsageKind::Message => "messages",
            UsageKind::Image => "images",
        }
    }

    pub fn used(&self, record: &sub::Model) -> i32 {
        match self {
            UsageKind::Message => record.messages_used,
            UsageKind::Image => record.images_used,
        }
    }

    pub fn limit(&self, record: &sub::Model) -> i32 {
        match self {
            UsageKind::Message => record.message_limit,
            UsageKind::Image => record.image_limit,
        }
    }

    pub fn column(&self) -> sub::Column {
        match self {
            UsageKind::Message => sub::Column::MessagesUsed,
            UsageKind::Image => sub::Column::ImagesUsed,
        }
    }
}

impl std::fmt::Display for UsageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageKind::Message => write!(f, "message"),
            UsageKind::Image => write!(f, "image"),
        }
    }
}

/// Why an action was refused. These are expected outcomes, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    TrialExpired,
    SubscriptionInactive,
    LimitReached { kind: UsageKind, limit: i32 },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::TrialExpired => {
                write!(f, "Free trial expired. Subscribe for $6/month to continue.")
            }
            DenialReason::SubscriptionInactive => {
                write!(f, "Subscription inactive. Subscribe for $6/month to continue.")
            }
            DenialReason::LimitReached { kind, limit } => write!(
                f,
                "Trial limit reached ({limit} {}). Subscribe for unlimited access.",
                kind.label()
            ),
        }
    }
}

/// Outcome of a limit check. `subscription` is `None` only when the store
/// could not be read and the check failed open.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageDecision {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
    pub subscription: Option<sub::Model>,
}

impl UsageDecision {
    pub fn allow(subscription: sub::Model) -> Self {
        Self {
            allowed: true,
            reason: None,
            subscription: Some(subscription),
        }
    }

    pub fn deny(subscription: sub::Model, reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            subscription: Some(subscription),
        }
    }

    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            reason: None,
            subscription: None,
        }
    }

    pub fn reason_message(&self) -> Option<String> {
        self.reason.as_ref().map(ToString::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user_email: String,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub trial_start_date: DateTime<Utc>,
    pub trial_end_date: DateTime<Utc>,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub messages_used: i32,
    pub images_used: i32,
    pub message_limit: i32,
    pub image_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<sub::Model> for SubscriptionResponse {
    fn from(m: sub::Model) -> Self {
        Self {
            id: m.id,
            user_email: m.user_email,
            stripe_customer_id: m.stripe_customer_id,
            subscription_status: m.subscription_status,
            trial_start_date: m.trial_start_date,
            trial_end_date: m.trial_end_date,
            subscription_start_date: m.subscription_start_date,
            messages_used: m.messages_used,
            images_used: m.images_used,
            message_limit: m.message_limit,
            image_limit: m.image_limit,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Body of the 403 returned when a metered action is refused.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageDeniedResponse {
    pub error: String,
    pub upgrade_url: String,
    pub subscription: Option<SubscriptionResponse>,
}

/// Record plus derived quota figures for the usage indicator.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsageSummaryResponse {
    pub subscription: SubscriptionResponse,
    /// Unlimited (null) unless the record is on trial.
    pub messages_remaining: Option<i32>,
    pub images_remaining: Option<i32>,
    /// Whole days left, rounded up; null unless on trial.
    pub trial_days_left: Option<i64>,
}
