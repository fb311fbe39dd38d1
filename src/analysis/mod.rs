//! 状态空间分析：可达图构造、路径登记与死锁报告。

pub mod reachability;

pub use reachability::{Analysis, AnalysisConfig, EdgeSlot, PathRecord, StateEdge, StateNode};
