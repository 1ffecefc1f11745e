// Services module - clients for external provider APIs

pub mod metrika;
pub mod oauth;

pub use metrika::{MetrikaError, MetrikaService};
pub use oauth::{OAuthError, OAuthProfile, OAuthProvider};
