//! 执行引擎：就绪判定、故事脚本、策略注入与原子组发射。

pub mod engine;
pub mod strategy;

pub use engine::{Execution, FiredGroup};
pub use strategy::{Deterministic, SelectionStrategy, Stochastic};
