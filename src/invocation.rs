//! Invocation boundary.
//!
//! Each component run ends with `{"statusCode": <u16>, "body": "<summary>"}`.

use std::fmt::Display;

use serde::Serialize;

use crate::error::PipelineError;

/// Status code of a successful invocation.
pub const STATUS_OK: u16 = 200;

/// What an invocation hands back to its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body.into(),
        }
    }

    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            status_code: error.status_code(),
            body: error.to_string(),
        }
    }

    /// 200 with the report's summary, or the error's status and message.
    pub fn from_result<T: Display>(result: &Result<T, PipelineError>) -> Self {
        match result {
            Ok(report) => Self::ok(report.to_string()),
            Err(e) => Self::from_error(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"statusCode\":{},\"body\":{:?}}}",
                self.status_code, self.body
            )
        })
    }
}
