//! configuration and lifecycle of a single stack
use crate::remote::{
    AwsParameter, AwsTag, ClientError, CloudFormation, CreateStackRequest, RemoteStack,
    UpdateStackRequest, ALREADY_EXISTS,
};
use indexmap::{IndexMap, IndexSet};

/// Value of a stack parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Value(String),
    /// Keep whatever the remote stack currently has
    UsePrevious,
}

#[derive(Debug)]
enum State<S> {
    Unbuilt,
    Created(S),
    Deleted,
}

/// A named stack
///
/// Builder methods take `&mut self` and hand the same instance back, so calls can be
/// chained on a binding the caller keeps:
///
/// ```
/// # use catalyst::remote::*;
/// # struct Client;
/// # struct Handle;
/// # impl RemoteStack for Handle {
/// #     fn update(&self, _: &UpdateStackRequest) -> Result<(), ClientError> { Ok(()) }
/// #     fn delete(&self) -> Result<(), ClientError> { Ok(()) }
/// # }
/// # impl CloudFormation for Client {
/// #     type Stack = Handle;
/// #     fn create_stack(&self, _: &CreateStackRequest) -> Result<Handle, ClientError> { Ok(Handle) }
/// # }
/// let mut stack = catalyst::stack::Stack::new("network", Client);
/// stack
///     .with_parameter("CidrBlock", "10.0.0.0/16")
///     .with_tag("team", "platform")
///     .with_capability("CAPABILITY_IAM");
///
/// stack.create("{}").unwrap();
/// stack.delete().unwrap();
/// ```
pub struct Stack<C: CloudFormation> {
    name: String,
    client: C,
    parameters: IndexMap<String, ParameterValue>,
    tags: IndexMap<String, String>,
    capabilities: IndexSet<String>,
    state: State<C::Stack>,
}

impl<C: CloudFormation> std::fmt::Debug for Stack<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("tags", &self.tags)
            .field("capabilities", &self.capabilities)
            .field("created", &self.is_created())
            .finish()
    }
}

impl<C: CloudFormation> Stack<C> {
    pub fn new(name: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            client,
            parameters: Default::default(),
            tags: Default::default(),
            capabilities: Default::default(),
            state: State::Unbuilt,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Handle of the remote stack, once created
    pub fn remote(&self) -> Option<&C::Stack> {
        match &self.state {
            State::Created(remote) => Some(remote),
            State::Unbuilt | State::Deleted => None,
        }
    }

    pub fn is_created(&self) -> bool {
        self.remote().is_some()
    }

    pub fn with_parameter(&mut self, key: impl ToString, value: impl ToString) -> &mut Self {
        self.set_parameter(key.to_string(), ParameterValue::Value(value.to_string()))
    }

    /// Add a parameter that keeps the value currently stored on the remote stack
    pub fn with_previous_parameter(&mut self, key: impl ToString) -> &mut Self {
        self.set_parameter(key.to_string(), ParameterValue::UsePrevious)
    }

    fn set_parameter(&mut self, key: String, value: ParameterValue) -> &mut Self {
        tracing::trace!(stack = %self.name, %key, ?value, "set parameter");
        self.parameters.insert(key, value);
        self
    }

    pub fn without_parameter(&mut self, key: impl ToString) -> &mut Self {
        self.parameters.shift_remove(&key.to_string());
        self
    }

    /// Switch every parameter to [ParameterValue::UsePrevious]
    pub fn carry_over_parameters(&mut self) -> &mut Self {
        for value in self.parameters.values_mut() {
            *value = ParameterValue::UsePrevious;
        }
        self
    }

    pub fn with_tag(&mut self, key: impl ToString, value: impl ToString) -> &mut Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn without_tag(&mut self, key: impl ToString) -> &mut Self {
        self.tags.shift_remove(&key.to_string());
        self
    }

    pub fn with_capability(&mut self, name: impl ToString) -> &mut Self {
        self.capabilities.insert(name.to_string());
        self
    }

    pub fn without_capability(&mut self, name: impl ToString) -> &mut Self {
        self.capabilities.shift_remove(&name.to_string());
        self
    }

    pub fn aws_parameters(&self) -> Vec<AwsParameter> {
        self.parameters
            .iter()
            .map(|(key, value)| match value {
                ParameterValue::Value(value) => AwsParameter::value(key, value),
                ParameterValue::UsePrevious => AwsParameter::use_previous(key),
            })
            .collect()
    }

    pub fn aws_tags(&self) -> Vec<AwsTag> {
        self.tags
            .iter()
            .map(|(key, value)| AwsTag::new(key.clone(), value.clone()))
            .collect()
    }

    pub fn aws_capabilities(&self) -> Vec<String> {
        self.capabilities.iter().cloned().collect()
    }

    pub fn create_request(&self, template_body: impl Into<String>) -> CreateStackRequest {
        CreateStackRequest {
            stack_name: self.name.clone(),
            template_body: template_body.into(),
            parameters: self.aws_parameters(),
            capabilities: self.aws_capabilities(),
            tags: self.aws_tags(),
        }
    }

    pub fn update_request(&self, template_body: impl Into<String>) -> UpdateStackRequest {
        UpdateStackRequest {
            template_body: template_body.into(),
            parameters: self.aws_parameters(),
            capabilities: self.aws_capabilities(),
            tags: self.aws_tags(),
        }
    }

    /// Create the stack on the remote side
    ///
    /// On success the remote handle is kept and all parameters are carried over, so a
    /// following [Stack::update] reuses the values that were just sent. On failure the
    /// stack is left as it was.
    pub fn create(&mut self, template_body: impl Into<String>) -> Result<&mut Self, StackError> {
        let request = self.create_request(template_body);
        tracing::info!(stack = %self.name, "creating stack");

        let remote = self.client.create_stack(&request).map_err(|source| {
            if source.code() == Some(ALREADY_EXISTS) {
                tracing::debug!(stack = %self.name, %source, "stack name already taken");
                StackError::StackExists {
                    name: self.name.clone(),
                    source,
                }
            } else {
                StackError::Client(source)
            }
        })?;

        self.state = State::Created(remote);
        self.carry_over_parameters();
        tracing::info!(stack = %self.name, "stack created");
        Ok(self)
    }

    /// Push the current configuration and `template_body` to the created stack
    pub fn update(&mut self, template_body: impl Into<String>) -> Result<&mut Self, StackError> {
        let State::Created(remote) = &self.state else {
            return Err(self.no_active_stack());
        };

        tracing::info!(stack = %self.name, "updating stack");
        remote.update(&self.update_request(template_body))?;
        Ok(self)
    }

    pub fn delete(&mut self) -> Result<(), StackError> {
        let State::Created(remote) = &self.state else {
            return Err(self.no_active_stack());
        };

        tracing::info!(stack = %self.name, "deleting stack");
        remote.delete()?;

        self.state = State::Deleted;
        tracing::info!(stack = %self.name, "stack deleted");
        Ok(())
    }

    fn no_active_stack(&self) -> StackError {
        StackError::NoActiveStack {
            name: self.name.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StackError {
    #[error("Stack {name} already exists")]
    StackExists {
        name: String,
        #[source]
        source: ClientError,
    },
    #[error("No active stack {name}, it was never created or is already deleted")]
    NoActiveStack { name: String },
    #[error(transparent)]
    Client(#[from] ClientError),
}
