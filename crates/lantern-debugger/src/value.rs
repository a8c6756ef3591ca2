//! Shallow, transport-safe descriptions of runtime values and completions.
//!
//! Values are never deep-copied: an object is described by its class name only,
//! so cyclic or unbounded graphs never cross the session boundary.

use serde::Serialize;

use crate::error::{DebugError, DebugResult};

/// A value as reported by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(ObjectRef),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    pub id: u64,
    pub class: String,
}

/// Raw completion of a host evaluation. `None` at the call site means the code
/// was terminated before it could complete.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCompletion {
    pub return_value: Option<RuntimeValue>,
    pub throw_value: Option<RuntimeValue>,
}

impl RawCompletion {
    pub fn returned(value: RuntimeValue) -> Self {
        Self {
            return_value: Some(value),
            throw_value: None,
        }
    }

    pub fn threw(value: RuntimeValue) -> Self {
        Self {
            return_value: None,
            throw_value: Some(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueSummary {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object { class: String },
}

impl From<&RuntimeValue> for ValueSummary {
    fn from(value: &RuntimeValue) -> Self {
        match value {
            RuntimeValue::Undefined => ValueSummary::Undefined,
            RuntimeValue::Null => ValueSummary::Null,
            RuntimeValue::Boolean(b) => ValueSummary::Boolean(*b),
            RuntimeValue::Number(n) => ValueSummary::Number(*n),
            RuntimeValue::String(s) => ValueSummary::String(s.clone()),
            RuntimeValue::Object(obj) => ValueSummary::Object {
                class: obj.class.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CompletionOutcome {
    Return(ValueSummary),
    Throw(ValueSummary),
    Terminated,
}

impl CompletionOutcome {
    /// Map a host completion. A throw wins over a return value if a host
    /// reports both.
    pub fn from_raw(raw: Option<RawCompletion>) -> DebugResult<Self> {
        let Some(raw) = raw else {
            return Ok(CompletionOutcome::Terminated);
        };

        if let Some(thrown) = &raw.throw_value {
            return Ok(CompletionOutcome::Throw(thrown.into()));
        }
        match &raw.return_value {
            Some(value) => Ok(CompletionOutcome::Return(value.into())),
            None => Err(DebugError::MalformedCompletion),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionType {
    Return,
    Throw,
    Terminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Object,
}

/// Wire form of an eval result:
/// `{"completionType": "return", "valueType": "number", "numberValue": 42}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalResult {
    pub completion_type: CompletionType,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
}

impl EvalResult {
    fn with_value(completion_type: CompletionType, value: &ValueSummary) -> Self {
        let mut result = Self {
            completion_type,
            value_type: ValueType::Undefined,
            boolean_value: None,
            number_value: None,
            string_value: None,
            object_class: None,
        };
        match value {
            ValueSummary::Undefined => {}
            ValueSummary::Null => result.value_type = ValueType::Null,
            ValueSummary::Boolean(b) => {
                result.value_type = ValueType::Boolean;
                result.boolean_value = Some(*b);
            }
            ValueSummary::Number(n) => {
                result.value_type = ValueType::Number;
                result.number_value = Some(*n);
            }
            ValueSummary::String(s) => {
                result.value_type = ValueType::String;
                result.string_value = Some(s.clone());
            }
            ValueSummary::Object { class } => {
                result.value_type = ValueType::Object;
                result.object_class = Some(class.clone());
            }
        }
        result
    }
}

impl From<&CompletionOutcome> for EvalResult {
    fn from(outcome: &CompletionOutcome) -> Self {
        match outcome {
            CompletionOutcome::Return(value) => Self::with_value(CompletionType::Return, value),
            CompletionOutcome::Throw(value) => Self::with_value(CompletionType::Throw, value),
            CompletionOutcome::Terminated => {
                Self::with_value(CompletionType::Terminated, &ValueSummary::Undefined)
            }
        }
    }
}
