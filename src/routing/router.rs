//! Route table construction for resource controllers.
//!
//! # Responsibilities
//! - Register controllers under a collection prefix
//! - Generate the conventional collection and item routes per controller
//! - Serve an API root that lists every registered collection
//!
//! # Design Decisions
//! - Built once at startup and frozen into an axum `Router`
//! - Paths keep their trailing slash (`/api/todo/`, `/api/todo/{id}/`)
//! - Ids that do not parse are treated as missing (404), not as bad input
//! - Writes to a missing item are 404 before the body is looked at

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::http::error::ApiError;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
use crate::routing::resource::{Resource, ResourceController};

/// Builder for the REST routes of one or more resources.
///
/// ```text
/// GET            {base}/                 API root
/// GET, POST      {base}/{prefix}/        list, create
/// GET, PUT,
/// PATCH, DELETE  {base}/{prefix}/{id}/   retrieve, update, destroy
/// ```
pub struct ResourceRouter {
    base: String,
    prefixes: Vec<String>,
    router: Router,
}

/// Per-resource handler state.
struct Endpoint<C> {
    controller: Arc<C>,
    /// Collection path, e.g. `/api/todo/`.
    collection: Arc<str>,
}

impl<C> Clone for Endpoint<C> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            collection: Arc::clone(&self.collection),
        }
    }
}

impl ResourceRouter {
    /// Start a route table mounted at `base` (e.g. `/api`).
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            base,
            prefixes: Vec::new(),
            router: Router::new(),
        }
    }

    /// Register a controller under `{base}/{prefix}/`.
    pub fn register<C: ResourceController>(mut self, prefix: &str, controller: Arc<C>) -> Self {
        let prefix = prefix.trim_matches('/').to_string();
        let collection = format!("{}/{}/", self.base, prefix);
        let item = format!("{}{{id}}/", collection);

        tracing::debug!(collection = %collection, item = %item, "Registering resource routes");

        let endpoint = Endpoint {
            controller,
            collection: Arc::from(collection.as_str()),
        };

        let routes = Router::new()
            .route(&collection, get(list::<C>).post(create::<C>))
            .route(
                &item,
                get(retrieve::<C>)
                    .put(update::<C>)
                    .patch(partial_update::<C>)
                    .delete(destroy::<C>),
            )
            .with_state(endpoint);

        self.router = self.router.merge(routes);
        self.prefixes.push(prefix);
        self
    }

    /// Registered collection prefixes, in registration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Freeze the table, adding the API root.
    pub fn into_router(self) -> Router {
        let root = format!("{}/", self.base);
        let base = Arc::<str>::from(self.base.as_str());
        let prefixes = Arc::new(self.prefixes);

        self.router.route(
            &root,
            get(move |headers: HeaderMap| api_root(headers, base, prefixes)),
        )
    }
}

async fn api_root(headers: HeaderMap, base: Arc<str>, prefixes: Arc<Vec<String>>) -> Json<Value> {
    let origin = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("{}://{}", request_scheme(&headers), host))
        .unwrap_or_default();

    let links: Map<String, Value> = prefixes
        .iter()
        .map(|prefix| {
            let url = format!("{}{}/{}/", origin, base, prefix);
            (prefix.clone(), Value::String(url))
        })
        .collect();

    Json(Value::Object(links))
}

/// `https` when a TLS-terminating proxy says so, otherwise `http`.
fn request_scheme(headers: &HeaderMap) -> &'static str {
    let forwarded = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    match forwarded {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

/// An empty body counts as an empty object so required-field errors apply.
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedJson(e.to_string()))
}

async fn list<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
) -> Result<Json<Vec<C::Item>>, ApiError> {
    endpoint.controller.list().await.map(Json)
}

async fn create<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let item = endpoint.controller.create(parse_body(&body)?).await?;
    let location = format!("{}{}/", endpoint.collection, item.id());
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(item)))
}

async fn retrieve<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
    Path(id): Path<String>,
) -> Result<Json<C::Item>, ApiError> {
    endpoint.controller.retrieve(parse_id(&id)?).await.map(Json)
}

/// Look the item up before reading the body, so a missing id is a 404
/// whatever the payload.
async fn write<C: ResourceController>(
    endpoint: &Endpoint<C>,
    id: &str,
    body: &Bytes,
    partial: bool,
) -> Result<Json<C::Item>, ApiError> {
    let id = parse_id(id)?;
    endpoint.controller.retrieve(id).await?;
    endpoint
        .controller
        .update(id, parse_body(body)?, partial)
        .await
        .map(Json)
}

async fn update<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<C::Item>, ApiError> {
    write(&endpoint, &id, &body, false).await
}

async fn partial_update<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<C::Item>, ApiError> {
    write(&endpoint, &id, &body, true).await
}

async fn destroy<C: ResourceController>(
    State(endpoint): State<Endpoint<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    endpoint.controller.destroy(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
