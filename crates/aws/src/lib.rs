//! AWS collaborators for the spill dispatcher.
//!
//! - **SQS** (`sqs` feature): [`SqsQueue`](sqs::SqsQueue) implements
//!   [`QueueClient`](spill_core::QueueClient) with `SendMessage`
//! - **S3** (`s3` feature): [`S3BlobStore`](s3::S3BlobStore) implements
//!   [`BlobClient`](spill_core::BlobClient) with `PutObject`
//!
//! Both share an [`AwsBaseConfig`](config::AwsBaseConfig) for region, endpoint
//! override, and optional STS assume-role credentials.

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "sqs")]
pub mod sqs;

#[cfg(feature = "s3")]
pub mod s3;

pub use config::AwsBaseConfig;
pub use error::SdkFailure;

#[cfg(feature = "sqs")]
pub use sqs::{SqsConfig, SqsQueue};

#[cfg(feature = "s3")]
pub use s3::{S3BlobStore, S3Config};
