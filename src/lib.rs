//! pneu — 1-safe Petri net modeling, execution and state-space analysis.
//!
//! The crate is split the way the data flows: an external compiler hands
//! [`net::Net::new`] plain collections of place/transition/arc records;
//! [`exec::Execution`] mutates one net instance step by step under a
//! story or an injected selection strategy; [`sim::BatchSimulator`]
//! drives many isolated instances and aggregates event logs;
//! [`analysis::Analysis`] drives one instance exhaustively to build the
//! reachable marking graph and report deadlocks.

pub mod analysis;
pub mod exec;
pub mod net;
pub mod report;
pub mod sim;

pub use analysis::{Analysis, AnalysisConfig};
pub use exec::{Deterministic, Execution, FiredGroup, SelectionStrategy, Stochastic};
pub use net::{ArcKind, ArcSpec, BuildError, Endpoint, Marking, Net, NetState, PlaceSpec,
    TransitionSpec};
pub use report::{AnalysisReport, DeadlockState};
pub use sim::{BatchConfig, BatchReport, BatchSimulator, EventRecord};
