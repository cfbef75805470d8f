//! metrics - 包耦合度分析
//!
//! 包装外部耦合度分析引擎, 给出每个包的传入/传出依赖数

mod adapter;
mod engine;

pub use adapter::{analyze, cross_check, ClassPath, Coupling, MetricsOutcome, PackageMetrics};
pub use engine::{CommandEngine, CouplingEngine, CouplingReport, MetricsError, PackageCoupling, Result};
