// Edge route filter layer
// Decision: Runs in front of every route and only inspects cookie names; the
// session guard in each page handler stays authoritative.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use thesis_portal_core::{RouteDecision, RouteFilter};

/// Middleware: apply the edge route filter to the request path
pub async fn filter_routes(
    State(filter): State<Arc<RouteFilter>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let decision = filter.decide(
        request.uri().path(),
        jar.iter().map(|cookie| cookie.name()),
    );

    match decision {
        RouteDecision::Redirect { to } => Redirect::to(&to).into_response(),
        _ => next.run(request).await,
    }
}
