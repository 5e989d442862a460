//! # Result Sink
//!
//! Writes one pretty-printed JSON document per index to
//! `<prefix>_<index>.json`, replacing whatever was there.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use ef_core::{output_path, IndexName, ResultPayload};

use crate::{FanoutError, Result};

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone)]
pub struct ResultSink {
    prefix: String,
}

impl ResultSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Serialize `payload` and write it to this index's output path.
    pub async fn write(&self, index: &IndexName, payload: &ResultPayload) -> Result<PathBuf> {
        let path = output_path(&self.prefix, index);
        let bytes = render(payload)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| FanoutError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Four-space indented JSON, keys in the order the service sent them.
fn render(payload: &ResultPayload) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    payload.serialize(&mut ser)?;
    Ok(out)
}
