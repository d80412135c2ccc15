pub mod booking_service;
pub mod generation_service;
pub mod ledger_service;
pub mod newsletter_service;
pub mod place_service;

pub use booking_service::*;
pub use generation_service::*;
pub use ledger_service::*;
pub use newsletter_service::*;
pub use place_service::*;
