use lambda_runtime::{service_fn, Context, Error, LambdaEvent};

use log::{debug, info};
use std::sync::Arc;
use torch_serve::artifact::{self, S3Store};
use torch_serve::{handler, Config, ImageClassifier, InvocationEvent, InvocationResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = Config::from_env()?;

    let store = S3Store::from_env().await;
    artifact::fetch_model(
        &store,
        &config.model_uri,
        &config.archive_path,
        &config.extract_dir,
    )
    .await?;

    let classifier = Arc::new(
        ImageClassifier::load(
            &config.model_path,
            &config.label_mapping_path,
            config.top_k,
        )?
        .with_interpolation(config.interpolation),
    );

    debug!("Loaded model in memory");

    let handler_closure = move |event: LambdaEvent<InvocationEvent>| {
        let classifier = Arc::clone(&classifier);
        async move { handle_request(event, &classifier) }
    };

    debug!("Dispatching handler");
    lambda_runtime::run(service_fn(handler_closure)).await?;

    Ok(())
}

fn handle_request(
    event: LambdaEvent<InvocationEvent>,
    classifier: &ImageClassifier,
) -> Result<InvocationResponse, Error> {
    let (payload, ctx) = event.into_parts();

    log_context(&ctx);
    debug!("Got event {:?}", payload);

    let response = handler::handle(&payload, classifier);

    info!("Lambda time remaining in MS: {}", remaining_millis(&ctx));

    Ok(response)
}

fn log_context(ctx: &Context) {
    info!("Lambda function ARN: {}", ctx.invoked_function_arn);
    info!("Lambda function version: {}", ctx.env_config.version);
    info!("Lambda Request ID: {}", ctx.request_id);
}

/// Milliseconds left before the host's deadline for this invocation.
fn remaining_millis(ctx: &Context) -> i64 {
    ctx.deadline as i64 - chrono::Utc::now().timestamp_millis()
}
