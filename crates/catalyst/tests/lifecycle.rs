//! Lifecycle tests
//!
//! Builds a template from files on disk, creates a stack from it against a recording
//! client and checks what went over the wire.

use catalyst::remote::{
    ClientError, CloudFormation, CreateStackRequest, RemoteStack, UpdateStackRequest,
    ALREADY_EXISTS,
};
use catalyst::stack::{Stack, StackError};
use catalyst::template::Template;
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    created: RefCell<Vec<CreateStackRequest>>,
    existing: RefCell<Vec<String>>,
    deleted: Rc<Cell<usize>>,
}

struct Handle(Rc<Cell<usize>>);

impl CloudFormation for Recorder {
    type Stack = Handle;

    fn create_stack(&self, request: &CreateStackRequest) -> Result<Handle, ClientError> {
        if self.existing.borrow().contains(&request.stack_name) {
            return Err(ClientError::service(
                ALREADY_EXISTS,
                format!("Stack [{}] already exists", request.stack_name),
            ));
        }

        self.existing.borrow_mut().push(request.stack_name.clone());
        self.created.borrow_mut().push(request.clone());
        Ok(Handle(self.deleted.clone()))
    }
}

impl RemoteStack for Handle {
    fn update(&self, _request: &UpdateStackRequest) -> Result<(), ClientError> {
        Ok(())
    }

    fn delete(&self) -> Result<(), ClientError> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

fn template() -> Template {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("base.yaml"),
        "Resources:\n  Queue:\n    Type: AWS::SQS::Queue\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("role.json"),
        r#"{"Resources": {"Role": {"Type": "AWS::IAM::Role"}}}"#,
    )
    .unwrap();

    let mut template = Template::new();
    template.load_directory(dir.path()).unwrap();
    template
}

#[test]
fn create_request_wire_format() {
    let body = template().render().unwrap();

    let mut stack = Stack::new("orders", Recorder::default());
    stack
        .with_parameter("Stage", "prod")
        .with_previous_parameter("ImageTag")
        .with_tag("team", "payments")
        .with_capability("CAPABILITY_IAM");
    stack.create(body).unwrap();

    let created = stack.client().created.borrow();
    insta::assert_json_snapshot!(created[0], @r###"
    {
      "StackName": "orders",
      "TemplateBody": "{\"Resources\":{\"Queue\":{\"Type\":\"AWS::SQS::Queue\"},\"Role\":{\"Type\":\"AWS::IAM::Role\"}}}",
      "Parameters": [
        {
          "ParameterKey": "Stage",
          "ParameterValue": "prod"
        },
        {
          "ParameterKey": "ImageTag",
          "UsePreviousValue": true
        }
      ],
      "Capabilities": [
        "CAPABILITY_IAM"
      ],
      "Tags": [
        {
          "Key": "team",
          "Value": "payments"
        }
      ]
    }
    "###);
}

#[test]
fn second_create_with_same_name() {
    let body = template().render().unwrap();
    let client = Recorder::default();
    client.existing.borrow_mut().push("orders".to_string());

    let mut stack = Stack::new("orders", client);
    let err = stack.create(body).unwrap_err();

    assert!(matches!(err, StackError::StackExists { .. }));
    assert_eq!(err.to_string(), "Stack orders already exists");
    let source = std::error::Error::source(&err).expect("original error is kept");
    assert_eq!(source.to_string(), "AlreadyExistsException: Stack [orders] already exists");
    assert!(!stack.is_created());
}

#[test]
fn create_then_delete() {
    let body = template().render().unwrap();
    let mut stack = Stack::new("orders", Recorder::default());

    stack.create(body).unwrap().delete().unwrap();

    assert_eq!(stack.client().deleted.get(), 1);
    assert!(matches!(
        stack.delete().unwrap_err(),
        StackError::NoActiveStack { .. }
    ));
}
