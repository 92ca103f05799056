// Middleware for caller authentication

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::MindServer;
use crate::auth::{bearer_token, CallerIdentity};

/// Identity resolved for the current request, `None` if unauthenticated
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<CallerIdentity>);

/// Resolve the bearer token into a [`Caller`] request extension
///
/// Never rejects on its own: an absent or unknown token yields
/// `Caller(None)` and the service decides.
pub async fn auth_middleware(
    State(server): State<Arc<MindServer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let identity = match token {
        Some(token) => {
            let identity = server.identity().verify(&token).await;
            if identity.is_none() {
                tracing::debug!("Bearer token rejected");
            }
            identity
        }
        None => None,
    };

    request.extensions_mut().insert(Caller(identity));
    next.run(request).await
}
