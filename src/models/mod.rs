pub mod booking;
pub mod chat;
pub mod common;
pub mod image;
pub mod newsletter;
pub mod pagination;
pub mod place;
pub mod subscription;

pub use booking::*;
pub use chat::*;
pub use common::*;
pub use image::*;
pub use newsletter::*;
pub use pagination::*;
pub use place::*;
pub use subscription::*;
