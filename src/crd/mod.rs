//! EntandoAppV2 custom resource model

mod app;
mod types;

pub use app::{EntandoAppV2, EntandoAppV2Spec, EntandoAppV2Status};
pub use types::{ComponentSpec, Condition, ConditionStatus};
