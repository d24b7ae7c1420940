pub mod credentials;
pub mod extract;
pub mod service;

pub use credentials::TokenKeys;
pub use extract::CurrentUser;
