use std::sync::Arc;

use spill_aws::{S3BlobStore, SqsQueue};
use spill_core::{Dispatcher, Route};
use tracing::info;

use super::message::MessageArgs;
use crate::OutputFormat;
use crate::config::FileConfig;

pub async fn run(
    config: FileConfig,
    args: &MessageArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let body = args.body()?;
    let attributes = args.attributes()?;

    let queue = SqsQueue::new(config.sqs_config()).await;
    let blob = S3BlobStore::new(config.s3_config()).await;
    let dispatcher = Dispatcher::new(config.dispatcher, Arc::new(queue), Arc::new(blob))?;

    let receipt = match dispatcher.send(&body, attributes.as_ref()).await {
        Ok(receipt) => receipt,
        Err(e) => {
            if let Some(pointer) = e.orphaned_object() {
                eprintln!(
                    "payload was stored at s3://{}/{} but the message was not sent",
                    pointer.bucket, pointer.key
                );
            }
            return Err(e.into());
        }
    };

    info!(total_bytes = receipt.size.total(), "message sent");

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        OutputFormat::Text => {
            match &receipt.route {
                Route::Direct => println!("Route:        direct"),
                Route::Offloaded(pointer) => {
                    println!("Route:        offloaded");
                    println!("Object:       s3://{}/{}", pointer.bucket, pointer.key);
                }
            }
            println!("Size:         {} bytes", receipt.size.total());
            if let Some(id) = &receipt.ack.message_id {
                println!("Message ID:   {id}");
            }
            if let Some(seq) = &receipt.ack.sequence_number {
                println!("Sequence:     {seq}");
            }
        }
    }

    Ok(())
}
