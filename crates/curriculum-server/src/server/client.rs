//! Client identity extracted from request metadata.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use curriculum::InteractionRecord;

/// Header carrying an optional caller-supplied user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Who sent a request, as far as the transport can tell.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Attach this client to an interaction record.
    pub fn apply(&self, record: InteractionRecord) -> InteractionRecord {
        record.with_client(
            self.user_id.clone(),
            self.ip_address.clone(),
            self.user_agent.clone(),
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Ok(ClientInfo {
            user_id: header_value(USER_ID_HEADER),
            ip_address: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string()),
            user_agent: header_value(header::USER_AGENT.as_str()),
        })
    }
}
