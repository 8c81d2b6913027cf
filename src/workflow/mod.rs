//! Workflow module - declarative workflow definitions
//!
//! Steps, variables, extraction schemas, the definition container and the
//! result types a run produces.

pub mod builtin;
pub mod definition;
pub mod result;
pub mod schema;
pub mod step;
pub mod variables;

pub use definition::Workflow;
pub use result::{ErrorInfo, ExtractionResult, WorkflowResult};
pub use schema::{ExtractSchema, FieldType, SchemaField};
pub use step::{StepKind, WorkflowStep};
pub use variables::Variables;
