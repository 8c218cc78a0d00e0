use std::collections::HashMap;

use serde::Serialize;
use worker::{Context, Env, Request, Response, Result, RouteContext, Router};

use crate::error::ApiError;
use crate::keys::parse_flag;
use crate::models::{ConversionResponse, StorageEvent};
use crate::storage_pipeline;

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    Router::new()
        .post_async("/api/v1/events", events_route)
        .run(req, env)
        .await
}

async fn events_route(mut req: Request, ctx: RouteContext<()>) -> Result<Response> {
    match events_response(&mut req, &ctx.env).await {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn events_response(req: &mut Request, env: &Env) -> Result<ConversionResponse, ApiError> {
    let query = parse_query(req)?;
    let family = match query.get("family") {
        Some(value) => storage_pipeline::parse_family(value)?,
        None => storage_pipeline::configured_family(env)?,
    };
    let force = query.get("force").is_some_and(|value| parse_flag(value));

    let body = req
        .text()
        .await
        .map_err(|error| ApiError::BadRequest(format!("unreadable request body: {error}")))?;
    let event = parse_event(&body)?;
    storage_pipeline::process_event(env, &event, family, force).await
}

/// Parses a replayed storage event body.
pub fn parse_event(body: &str) -> Result<StorageEvent, ApiError> {
    let event = serde_json::from_str::<StorageEvent>(body)?;
    if event.object.key.trim().is_empty() {
        return Err(ApiError::BadRequest("object key cannot be empty".to_string()));
    }
    Ok(event)
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req
        .url()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}
