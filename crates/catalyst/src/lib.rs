//! # catalyst - cloudformation stack helper
//!
//! ## Introduction for developers
//!
//! Read this to understand how the pieces fit together.
//!
//! ### Terms
//!
//! - a `stack` is a named collection of resources the control-plane manages as one unit
//! - a `template` is the document that describes those resources
//! - `parameters`, `tags` and `capabilities` are sent along with the template when a
//!   stack is created or updated
//!
//! ### Templates
//!
//! see [template::Template]
//!
//! Templates are usually split over several files: a base document and patches that add
//! or swap single resources. [template::Template::with_documents] merges them, one level
//! deep per section:
//!
//! ```
//! # use catalyst::template::Template;
//! # use serde_json::json;
//! let mut template = Template::new();
//! template.with_documents([
//!     json!({"Resources": {"Queue": {"Type": "AWS::SQS::Queue"}, "Topic": {"Type": "AWS::SNS::Topic"}}}),
//!     json!({"Resources": {"Queue": {"Type": "AWS::SQS::Queue", "Properties": {"FifoQueue": true}}}}),
//! ])?;
//!
//! assert_eq!(
//!     template.body()["Resources"]["Queue"],
//!     json!({"Type": "AWS::SQS::Queue", "Properties": {"FifoQueue": true}})
//! );
//! # Ok::<(), catalyst::template::TemplateError>(())
//! ```
//!
//! ### Stacks
//!
//! see [stack::Stack]
//!
//! A [stack::Stack] owns a [remote::CloudFormation] client and the stack configuration.
//! Configuration is built with chained `with_*`/`without_*` calls. Values are turned into
//! strings when they are added.
//!
//! | **state**  | **entered by**              | **allows**                  |
//! |------------|-----------------------------|-----------------------------|
//! | unbuilt    | [stack::Stack::new]         | `create`                    |
//! | created    | successful `create`         | `create`, `update`, `delete`|
//! | deleted    | successful `delete`         | `create`                    |
//!
//! A failed call never changes the state. The control-plane error code
//! `AlreadyExistsException` is reported as [stack::StackError::StackExists], every other
//! client error is passed on as [stack::StackError::Client].
//!
//! ### Regions
//!
//! see [region::RegionResolver]
//!
//! The region is looked up once, before a client is built: environment first, then the
//! configured profile, then the EC2 instance metadata endpoint. Not finding a region is
//! not an error, [region::require_region] turns it into one.
//!
pub mod region;
pub mod remote;
pub mod scratch;
pub mod stack;
pub mod template;
