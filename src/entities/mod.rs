pub mod ai_generations;
pub mod email_subscribers;
pub mod places;
pub mod subscriptions;
pub mod vip_bookings;

pub use ai_generations::GenerationMode;
pub use places::{BookingType, City, PlaceType};
pub use subscriptions::SubscriptionStatus;
pub use vip_bookings::{BookingStatus, VipBookingType};

pub use ai_generations as ai_generation_entity;
pub use email_subscribers as email_subscriber_entity;
pub use places as place_entity;
pub use subscriptions as subscription_entity;
pub use vip_bookings as vip_booking_entity;
