use std::sync::Arc;

use spill_core::memory::{MemoryBlobStore, MemoryQueue};
use spill_core::{DispatchPlan, Dispatcher, RouteDecision};

use super::message::MessageArgs;
use crate::OutputFormat;
use crate::config::FileConfig;

pub fn run(config: FileConfig, args: &MessageArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let plan = build_plan(config, args)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Text => {
            let route = match plan.decision {
                RouteDecision::Direct => "direct",
                RouteDecision::Offload if plan.forced => "offload (forced)",
                RouteDecision::Offload => "offload",
            };
            println!("Route:        {route}");
            println!(
                "Size:         {} bytes (body {}, attributes {})",
                plan.size.total(),
                plan.size.body,
                plan.size.attributes
            );
            println!("Threshold:    {} bytes", plan.threshold);
        }
    }

    Ok(())
}

/// Validate and measure the message against the configured limits. The
/// dispatcher is wired to in-memory collaborators, so nothing is sent.
fn build_plan(config: FileConfig, args: &MessageArgs) -> anyhow::Result<DispatchPlan> {
    let dispatcher = Dispatcher::new(
        config.dispatcher,
        Arc::new(MemoryQueue::new()),
        Arc::new(MemoryBlobStore::new()),
    )?;
    let body = args.body()?;
    let attributes = args.attributes()?;
    Ok(dispatcher.plan(&body, attributes.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> FileConfig {
        FileConfig::parse(&format!(
            "[dispatcher]\nqueue_url = \"q\"\nbucket = \"b\"\nsize_threshold = 8\n{extra}"
        ))
        .unwrap()
    }

    fn args(body: &str) -> MessageArgs {
        MessageArgs {
            body: body.to_owned(),
            attrs: Vec::new(),
            number_attrs: Vec::new(),
            binary_attrs: Vec::new(),
        }
    }

    #[test]
    fn small_body_goes_direct() {
        let plan = build_plan(config(""), &args(r#"{"x": 1}"#)).unwrap();
        assert_eq!(plan.decision, RouteDecision::Direct);
        assert_eq!(plan.size.body, 7);
        assert_eq!(plan.threshold, 8);
    }

    #[test]
    fn attributes_count_towards_size() {
        let mut input = args(r#"{"x": 1}"#);
        input.attrs.push(("a".into(), "b".into()));
        let plan = build_plan(config(""), &input).unwrap();
        assert_eq!(plan.decision, RouteDecision::Offload);
        assert_eq!(plan.size.attributes, 1 + 6 + 1);
        assert!(!plan.forced);
    }

    #[test]
    fn forced_offload_reported() {
        let plan = build_plan(config("force_offload = true\n"), &args("1")).unwrap();
        assert_eq!(plan.decision, RouteDecision::Offload);
        assert!(plan.forced);
    }

    #[test]
    fn null_body_rejected() {
        assert!(build_plan(config(""), &args("null")).is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = FileConfig::parse("[dispatcher]\nbucket = \"b\"\n").unwrap();
        let err = build_plan(config, &args("{}")).unwrap_err();
        assert!(err.to_string().contains("queue url is required"));
    }
}
