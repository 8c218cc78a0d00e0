pub mod error;
pub mod keys;
pub mod models;
pub mod routes;
pub mod storage_pipeline;

use worker::{Context, Env, MessageBatch, MessageExt, Request, Response, Result, event};

use crate::models::StorageEvent;

#[event(fetch)]
async fn fetch(req: Request, env: Env, ctx: Context) -> Result<Response> {
    routes::handle(req, env, ctx).await
}

#[event(queue)]
async fn queue(batch: MessageBatch<StorageEvent>, env: Env, _ctx: Context) -> Result<()> {
    let family = storage_pipeline::configured_family(&env)
        .map_err(|error| worker::Error::RustError(error.to_string()))?;

    for message in batch.messages()? {
        match storage_pipeline::process_event(&env, message.body(), family, false).await {
            Ok(response) => {
                worker::console_log!(
                    "event for '{}' finished: {:?}, outputs={:?}",
                    response.key,
                    response.status,
                    response.outputs
                );
                message.ack();
            }
            Err(error) if error.is_retryable() => {
                worker::console_error!(
                    "event for '{}' failed, retrying: {error}",
                    message.body().object.key
                );
                message.retry();
            }
            Err(error) => {
                worker::console_error!(
                    "event for '{}' cannot be converted: {error}",
                    message.body().object.key
                );
                message.ack();
            }
        }
    }

    Ok(())
}
