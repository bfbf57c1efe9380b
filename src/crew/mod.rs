pub mod crew;
pub mod definition;
pub mod delegation;

pub use crew::{Crew, CrewError, CrewOutput};
pub use definition::{AgentDefinition, CrewDefinition, TaskDefinition};
pub use delegation::{DelegateWorkTool, DELEGATE_WORK_TOOL};
