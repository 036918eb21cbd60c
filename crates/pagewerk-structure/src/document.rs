// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural document: the editable object graph of a single PDF page as
// produced by the structural-rewrite tool in JSON mode.

use indexmap::IndexMap;
use pagewerk_core::error::{PagewerkError, Result};
use serde::{Deserialize, Serialize};

/// Object identifier such as `"12 0"` (object number and generation).
pub type ObjectKey = String;

/// One page's structural representation.
///
/// `objects` keeps the order in which the tool emitted them; text extraction
/// and diff merging both rely on that order being stable for the lifetime of
/// the instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralDocument {
    /// Tool header, carried through untouched.
    #[serde(rename = "qpdf", default, skip_serializing_if = "serde_json::Value::is_null")]
    pub header: serde_json::Value,
    #[serde(default)]
    pub objects: IndexMap<ObjectKey, StructuralObject>,
}

/// A stream carrying a raw payload, an opaque value, or any other shape the
/// tool emits. Unrecognised shapes round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuralObject {
    Stream { stream: StreamObject },
    Value { value: serde_json::Value },
    Other(serde_json::Value),
}

/// Stream payload plus its dictionary, which is either a reference such as
/// `"2 0"` or an inline dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict: Option<serde_json::Value>,
    /// Absent when the tool did not expose the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StreamObject {
    /// The dictionary reference, when `dict` is one.
    pub fn dict_ref(&self) -> Option<&str> {
        self.dict.as_ref().and_then(serde_json::Value::as_str)
    }
}

impl StructuralObject {
    pub fn stream(&self) -> Option<&StreamObject> {
        match self {
            Self::Stream { stream } => Some(stream),
            Self::Value { .. } | Self::Other(_) => None,
        }
    }

    pub fn stream_mut(&mut self) -> Option<&mut StreamObject> {
        match self {
            Self::Stream { stream } => Some(stream),
            Self::Value { .. } | Self::Other(_) => None,
        }
    }
}

impl StructuralDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the tool's JSON output.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|err| {
            PagewerkError::ConversionError(format!("malformed structural JSON: {err}"))
        })
    }

    /// Serialise into the tool's structured-input format.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Append a stream object (builder used by tests and fixtures).
    pub fn with_stream(
        mut self,
        key: impl Into<ObjectKey>,
        dict_ref: Option<&str>,
        data: impl Into<String>,
    ) -> Self {
        self.objects.insert(
            key.into(),
            StructuralObject::Stream {
                stream: StreamObject {
                    dict: dict_ref.map(|key| serde_json::Value::String(key.to_owned())),
                    data: Some(data.into()),
                    extra: serde_json::Map::new(),
                },
            },
        );
        self
    }

    /// Append an opaque value object.
    pub fn with_value(mut self, key: impl Into<ObjectKey>, value: serde_json::Value) -> Self {
        self.objects.insert(key.into(), StructuralObject::Value { value });
        self
    }

    /// Payloads of the stream objects exposing `data`, in iteration order.
    pub fn streams(&self) -> impl Iterator<Item = (&ObjectKey, &str)> {
        self.objects.iter().filter_map(|(key, obj)| {
            let data = obj.stream()?.data.as_deref()?;
            Some((key, data))
        })
    }

    /// Mutable payloads of the stream objects exposing `data`.
    pub fn streams_mut(&mut self) -> impl Iterator<Item = (&ObjectKey, &mut String)> {
        self.objects.iter_mut().filter_map(|(key, obj)| {
            let data = obj.stream_mut()?.data.as_mut()?;
            Some((key, data))
        })
    }

    pub fn stream_count(&self) -> usize {
        self.streams().count()
    }
}
