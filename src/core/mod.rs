pub mod export;
pub mod service;

pub use export::LayoutFormat;
pub use service::{EnginePolicy, PlanogramService};
