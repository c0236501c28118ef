//! OAuth 2.0 and authenticated API access for the Yoto platform.
//!
//! # Components
//!
//! - [`oauth`]: identity provider endpoints, authorize URL, code and refresh grants
//! - [`context`]: request-scoped credential and token state
//! - [`credentials`]: builds a context from request headers and server configuration
//! - [`client`]: bearer-authenticated resource calls with refresh and one retry on 403

pub mod client;
pub mod context;
pub mod credentials;
pub mod error;
pub mod oauth;

pub use client::{DEFAULT_REQUEST_TIMEOUT, RequestOptions, YotoClient, http_client};
pub use context::{ClientContext, YOTO_API_BASE_URL};
pub use credentials::{CredentialHeaders, CredentialResolver, ServerCredentials};
pub use error::{OAuthError, Result};
pub use oauth::{CodeExchange, OAuthConfig, TokenResponse};
