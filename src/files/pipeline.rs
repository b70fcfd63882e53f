//! Ordered content mutations applied as one read-modify-write.
//!
//! Each step transforms the content produced by the previous one, so
//! `[Replace{"foo","bar"}, Append{"end"}]` and its reverse can disagree.

use serde_json::Value as JsonValue;

use crate::convert::type_name;
use crate::error::{McpError, Result};

/// One text transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStep {
    /// Replace every non-overlapping occurrence of `search`, left to right.
    Replace {
        /// Literal text to find
        search: String,
        /// Replacement text
        replace: String,
    },
    /// Append a newline and `text`.
    Append {
        /// Text to append
        text: String,
    },
    /// Prepend `text` and a newline.
    Prepend {
        /// Text to prepend
        text: String,
    },
}

impl MutationStep {
    /// Apply this step to `content`.
    pub fn apply(&self, content: String) -> String {
        match self {
            MutationStep::Replace { search, replace } => content.replace(search.as_str(), replace),
            MutationStep::Append { text } => content + "\n" + text,
            MutationStep::Prepend { text } => format!("{}\n{}", text, content),
        }
    }

    /// Parse one step from its wire form.
    ///
    /// `{"search", "replace"}`, `{"append"}` and `{"prepend"}` objects are
    /// recognized, in that order of precedence. Anything else yields `None` and
    /// is skipped by the pipeline rather than rejected.
    pub fn from_json(value: &JsonValue) -> Result<Option<Self>> {
        let obj = value.as_object().ok_or_else(|| McpError::MalformedInput {
            what: "modifications".to_string(),
            reason: format!("each step must be an object, got {}", type_name(value)),
        })?;
        let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);

        if let (Some(search), Some(replace)) = (text("search"), text("replace")) {
            return Ok(Some(MutationStep::Replace { search, replace }));
        }
        if let Some(text) = text("append") {
            return Ok(Some(MutationStep::Append { text }));
        }
        if let Some(text) = text("prepend") {
            return Ok(Some(MutationStep::Prepend { text }));
        }
        Ok(None)
    }
}

/// Ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPipeline {
    steps: Vec<MutationStep>,
    skipped: usize,
}

impl MutationPipeline {
    /// Build a pipeline from already-typed steps.
    pub fn new(steps: Vec<MutationStep>) -> Self {
        Self { steps, skipped: 0 }
    }

    /// Parse a JSON array of steps, skipping unrecognized entries.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| McpError::MalformedInput {
            what: "modifications".to_string(),
            reason: format!("expected an array of steps, got {}", type_name(value)),
        })?;

        let mut steps = Vec::with_capacity(items.len());
        let mut skipped = 0;
        for (index, item) in items.iter().enumerate() {
            match MutationStep::from_json(item)? {
                Some(step) => steps.push(step),
                None => {
                    tracing::warn!(index, step = %item, "skipping unrecognized modification step");
                    skipped += 1;
                }
            }
        }
        Ok(Self { steps, skipped })
    }

    /// Steps that will run, in order.
    pub fn steps(&self) -> &[MutationStep] {
        &self.steps
    }

    /// Number of input entries that were not recognized as steps.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Fold every step over `content` in order.
    pub fn apply(&self, content: String) -> String {
        self.steps.iter().fold(content, |acc, step| step.apply(acc))
    }
}
