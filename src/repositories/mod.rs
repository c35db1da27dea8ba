pub mod classification_repository;
pub mod email_repository;
pub mod label_repository;
pub mod preference_repository;
pub mod stats_repository;
pub mod user_repository;
pub mod waitlist_repository;

pub use classification_repository::*;
pub use email_repository::*;
pub use label_repository::*;
pub use preference_repository::*;
pub use stats_repository::*;
pub use user_repository::*;
pub use waitlist_repository::*;
