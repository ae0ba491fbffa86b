pub mod handlers;
pub mod password;
pub mod policy;
pub mod token;

pub use token::{Identity, TokenIssuer};
