// Re-export all models organized by domain
pub mod classification;
pub mod email;
pub mod errors;
pub mod gmail;
pub mod label;
pub mod preference;
pub mod request;
pub mod response;
pub mod stats;
pub mod user;
pub mod waitlist;

pub use classification::*;
pub use email::*;
pub use errors::*;
pub use gmail::*;
pub use label::*;
pub use preference::*;
pub use request::*;
pub use response::*;
pub use stats::*;
pub use user::*;
pub use waitlist::*;
