//! # 1-safe 网核心定义（布尔标识 Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`，标识为布尔向量 `M ∈ 𝔹^{|P|}`（每个库所
//! 至多一个令牌）。弧分三类：
//!
//! * **enabler** `(p, t)` / `(t, p)` — 标准流：发射要求输入侧 `M[p] = 1`，
//!   消耗阶段置 `M[p] = 0`，产出阶段对输出侧置 `M[p] = 1`；
//! * **inhibitor** `(p, t)` — 仅输入：`M[p] = 1` 时阻止发射，从不改写标识；
//! * **reset** `(t, p)` — 仅输出：发射后无条件置 `M[p] = 0`。
//!
//! 迁移 `t` **可激发** 当且仅当其全部 enabler 输入被标识且无 inhibitor
//! 输入被标识；**就绪** 判定额外放行从未发射过的源迁移（无 enabler 输入，
//! 每个网实例至多发射一次）。共享标签的迁移构成**总线组**，整组原子发射。
//!
//! 拓扑构造后不可变；运行状态（标识 + 发射计数）单独保存在 [`NetState`]
//! 中，批量仿真按状态向量克隆实现隔离。
//!
//! ## 示例
//!
//! ```rust
//! use pneu::net::{ArcSpec, Endpoint, Net, PlaceSpec, TransitionSpec};
//!
//! let net = Net::new(
//!     vec![PlaceSpec::new("start", true), PlaceSpec::new("done", false)],
//!     vec![TransitionSpec::new("go")],
//!     vec![
//!         ArcSpec::enabler(Endpoint::place(0), Endpoint::transition(0)),
//!         ArcSpec::enabler(Endpoint::transition(0), Endpoint::place(1)),
//!     ],
//! )
//! .unwrap();
//!
//! let state = net.initial_state();
//! let ready: Vec<_> = net.ready_groups(&state).keys().map(String::as_str).collect();
//! assert_eq!(ready, ["go"]);
//! assert_eq!(net.marking_to_string(state.marking()), "p1: true, p2: false");
//! ```

pub mod core;
pub mod generate;
pub mod ids;
pub mod io;
pub mod structure;

pub use self::core::{BuildError, Net, ReadyGroups};
pub use ids::{ArcId, Idx, IndexVec, PlaceId, TransitionId};
pub use io::{ArcSnapshot, IoError, NetSnapshot, PlaceSnapshot, TransitionSnapshot};
pub use structure::{
    Arc, ArcKind, ArcSpec, Endpoint, EntityRef, FireCount, Marking, NetState, NodeRef, Place,
    PlaceSpec, Transition, TransitionSpec,
};
