//! Relay handler
//!
//! Turns one inbound request into one outbound request, then streams the
//! target's answer back. GET forwards the query string, POST forwards a
//! form body; everything else about the two is shared.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use flyt_shared::{control::API_KEY, ControlParams, Error, ParamMap, Result};
use tracing::{debug, info, warn};

use crate::{headers, upstream, AppState};

/// Where the payload parameters come from and where they go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStrategy {
    /// GET: inbound query string -> outbound query string
    QueryString,
    /// POST: inbound form body -> outbound form body
    FormBody,
}

impl PayloadStrategy {
    pub fn for_method(method: &Method) -> Option<Self> {
        if *method == Method::GET {
            Some(Self::QueryString)
        } else if *method == Method::POST {
            Some(Self::FormBody)
        } else {
            None
        }
    }

    fn method(self) -> Method {
        match self {
            Self::QueryString => Method::GET,
            Self::FormBody => Method::POST,
        }
    }
}

/// Catch-all route: every path, every method
pub async fn relay(State(state): State<AppState>, req: Request) -> Response {
    info!("Received request: {} {}", req.method(), redact(req.uri()));

    match forward(&state, req).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("Relay failed ({}): {}", e.status(), e);
            error_response(&e)
        }
    }
}

async fn forward(state: &AppState, req: Request) -> Result<Response> {
    let strategy = PayloadStrategy::for_method(req.method())
        .ok_or_else(|| Error::MethodNotAllowed(req.method().to_string()))?;
    let (parts, body) = req.into_parts();

    let mut query = ParamMap::parse_query(parts.uri.query().unwrap_or_default());
    let mut form = match strategy {
        PayloadStrategy::QueryString => None,
        PayloadStrategy::FormBody => match read_form(body, state.config.max_body_bytes).await {
            Ok(form) => Some(form),
            // An unusable body supplies no control values; report their absence first
            Err(e) => {
                ControlParams::extract(&[&query])?;
                return Err(e);
            }
        },
    };

    // Query values win; the form only fills in what the query lacks
    let control = match &form {
        Some(form) => ControlParams::extract(&[&query, form])?,
        None => ControlParams::extract(&[&query])?,
    };
    ControlParams::strip(&mut query);
    if let Some(form) = form.as_mut() {
        ControlParams::strip(form);
    }

    let mut target = control.target()?;
    let headers = headers::outbound_headers(&parts.headers, &control.api_key, strategy)?;

    let (payload, body) = match form {
        None => {
            let encoded = query.encode();
            target.set_query((!encoded.is_empty()).then_some(encoded.as_str()));
            (query, None)
        }
        Some(form) => {
            let encoded = form.encode();
            (form, Some(encoded))
        }
    };

    info!(
        "Forwarding request to {} with params: {}",
        control.forward_url_lossy(),
        payload.summary()
    );

    let mut builder = state
        .client
        .request(strategy.method(), target)
        .headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    let outbound = builder.build().map_err(|e| Error::Build(e.to_string()))?;

    let upstream = upstream::send(&state.client, outbound, state.config.upstream_timeout()).await?;
    debug!("Target answered {}", upstream.status());

    let mut response = axum::http::Response::builder().status(upstream.status());
    if let Some(headers_mut) = response.headers_mut() {
        headers::relay_response_headers(upstream.headers(), headers_mut);
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| Error::Build(e.to_string()))
}

async fn read_form(body: Body, limit: usize) -> Result<ParamMap> {
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|e| Error::InvalidForm(format!("failed to read request body: {}", e)))?;
    ParamMap::parse_form(&bytes)
}

/// Plain-text error body, newline terminated
pub fn error_response(err: &Error) -> Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{}\n", err),
    )
        .into_response()
}

/// Path plus decoded query with the API key masked, for logs
fn redact(uri: &Uri) -> String {
    match uri.query() {
        Some(q) => format!("{}?{}", uri.path(), ParamMap::parse_query(q).redacted(API_KEY).summary()),
        None => uri.path().to_string(),
    }
}
