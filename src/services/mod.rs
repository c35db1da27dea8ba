pub mod account_service;
pub mod classification_service;
pub mod gmail_service;
pub mod preference_service;
pub mod waitlist_service;

pub use account_service::*;
pub use classification_service::*;
pub use gmail_service::*;
pub use preference_service::*;
pub use waitlist_service::*;
