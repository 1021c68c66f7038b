pub mod controller;
pub(crate) mod deadline;
pub mod lease;
