//! The dose model: reference-independent formulas, a lazy evaluation graph
//! that composes them, and the `Input`/`Constraints` types gating what the
//! graph is allowed to run on.

pub mod common;
pub mod constraints;
pub mod formulas;
pub mod input;
pub mod lazy_eval;
pub mod orchestrator;
pub mod quadrature;

pub use common::{FoodCategory, StabilityClass, TerrainType};
pub use constraints::{default_constraints, Constraints};
pub use formulas::{FormulaError, FormulaResult};
pub use input::Input;
pub use lazy_eval::LazyEval;
pub use orchestrator::{effective_dose_acute, effective_dose_for_period, Model, NuclideBreakdown};
