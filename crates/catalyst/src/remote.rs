//! the cloudformation control-plane boundary
//!
//! Everything in here is wire contract: field names are serialized exactly the way the
//! CloudFormation API expects them. The client itself is opaque, [CloudFormation] is the
//! only thing a [crate::stack::Stack] knows about it.
use serde::Serialize;

/// Error code the control-plane returns when a stack name is already taken
pub const ALREADY_EXISTS: &str = "AlreadyExistsException";

/// Request body of a `CreateStack` call
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStackRequest {
    pub stack_name: String,
    pub template_body: String,
    pub parameters: Vec<AwsParameter>,
    pub capabilities: Vec<String>,
    pub tags: Vec<AwsTag>,
}

/// Request body of an `UpdateStack` call, addressed through an existing [RemoteStack]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackRequest {
    pub template_body: String,
    pub parameters: Vec<AwsParameter>,
    pub capabilities: Vec<String>,
    pub tags: Vec<AwsTag>,
}

/// A single stack parameter
///
/// Serializes either as `{"ParameterKey": .., "ParameterValue": ..}` or as
/// `{"ParameterKey": .., "UsePreviousValue": true}`, never with both value fields.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AwsParameter {
    pub parameter_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_previous_value: Option<bool>,
}

impl AwsParameter {
    pub fn value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: Some(value.into()),
            use_previous_value: None,
        }
    }

    pub fn use_previous(key: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: None,
            use_previous_value: Some(true),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, derive_new::new)]
#[serde(rename_all = "PascalCase")]
pub struct AwsTag {
    pub key: String,
    pub value: String,
}

/// The control-plane client
pub trait CloudFormation {
    /// Handle to a stack that exists on the remote side
    type Stack: RemoteStack;

    fn create_stack(&self, request: &CreateStackRequest) -> Result<Self::Stack, ClientError>;
}

/// A stack known to the control-plane
pub trait RemoteStack {
    fn update(&self, request: &UpdateStackRequest) -> Result<(), ClientError>;

    fn delete(&self) -> Result<(), ClientError>;
}

/// Errors raised by a [CloudFormation] client
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The control-plane answered with an error code
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    /// The request never got a structured answer
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error code reported by the control-plane, if there is one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Service { code, .. } => Some(code),
            ClientError::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parameter_wire_shape() {
        assert_eq!(
            serde_json::to_value(AwsParameter::value("Env", "prod")).unwrap(),
            json!({"ParameterKey": "Env", "ParameterValue": "prod"})
        );
        assert_eq!(
            serde_json::to_value(AwsParameter::use_previous("Env")).unwrap(),
            json!({"ParameterKey": "Env", "UsePreviousValue": true})
        );
    }

    #[test]
    fn update_request_has_no_stack_name() {
        let request = UpdateStackRequest {
            template_body: "{}".into(),
            parameters: vec![],
            capabilities: vec!["CAPABILITY_IAM".into()],
            tags: vec![AwsTag::new("team".into(), "infra".into())],
        };

        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "TemplateBody": "{}",
                "Parameters": [],
                "Capabilities": ["CAPABILITY_IAM"],
                "Tags": [{"Key": "team", "Value": "infra"}],
            })
        );
    }

    #[test]
    fn error_code() {
        assert_eq!(ClientError::service(ALREADY_EXISTS, "").code(), Some(ALREADY_EXISTS));
        let transport = ClientError::Transport("connection reset".into());
        assert_eq!(transport.code(), None);
    }
}
