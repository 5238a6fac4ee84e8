use anyhow::Context;
use base64::Engine;
use clap::Args;
use spill_core::{MessageAttribute, MessageAttributes};

/// Message inputs shared by `send` and `plan`.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// JSON body (string or @file path).
    #[arg(long)]
    pub body: String,
    /// String attributes (name=value).
    #[arg(long = "attr", value_parser = parse_key_val)]
    pub attrs: Vec<(String, String)>,
    /// Number attributes (name=value).
    #[arg(long = "number-attr", value_parser = parse_key_val)]
    pub number_attrs: Vec<(String, String)>,
    /// Binary attributes (name=base64).
    #[arg(long = "binary-attr", value_parser = parse_key_val)]
    pub binary_attrs: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid NAME=VALUE: no `=` found in `{s}`"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

impl MessageArgs {
    /// The body as JSON, read from a file when prefixed with `@`.
    pub fn body(&self) -> anyhow::Result<serde_json::Value> {
        if let Some(path) = self.body.strip_prefix('@') {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read body file {path}"))?;
            serde_json::from_str(&content).with_context(|| format!("body file {path} is not JSON"))
        } else {
            serde_json::from_str(&self.body).context("body is not valid JSON")
        }
    }

    /// The attributes given on the command line, or `None` when there are none.
    pub fn attributes(&self) -> anyhow::Result<Option<MessageAttributes>> {
        let mut attributes = MessageAttributes::new();
        for (name, value) in &self.attrs {
            attributes.insert(name.clone(), MessageAttribute::string(value.clone()));
        }
        for (name, value) in &self.number_attrs {
            let number = value
                .parse::<f64>()
                .with_context(|| format!("number attribute {name} is not numeric: {value}"))?;
            anyhow::ensure!(
                number.is_finite(),
                "number attribute {name} must be finite: {value}"
            );
            attributes.insert(name.clone(), MessageAttribute::number(value));
        }
        for (name, value) in &self.binary_attrs {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(value)
                .with_context(|| format!("binary attribute {name} is not valid base64"))?;
            attributes.insert(name.clone(), MessageAttribute::binary(bytes));
        }
        Ok((!attributes.is_empty()).then_some(attributes))
    }
}
