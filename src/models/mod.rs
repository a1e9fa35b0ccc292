pub mod account;
pub mod api_key;
pub mod business;
pub mod rating_request;
pub mod savepoint;
pub mod stats;
pub mod user_document;

pub use account::*;
pub use api_key::*;
pub use business::*;
pub use rating_request::*;
pub use savepoint::*;
pub use stats::*;
pub use user_document::*;
