//! 标准拓扑生成器，用于测试与基准。
use crate::net::structure::{ArcSpec, Endpoint, PlaceSpec, TransitionSpec};

/// A generated topology, ready to hand to [`crate::net::Net::new`].
pub type Topology = (Vec<PlaceSpec>, Vec<TransitionSpec>, Vec<ArcSpec>);

/// Linear chain `p0 -> t1 -> p1 -> … -> tn -> pn` with `p0` marked.
///
/// Reaches exactly `n + 1` markings and deadlocks once the token sits in
/// the last place.
pub fn serial(n: usize) -> Topology {
    let mut places = vec![PlaceSpec::new("p0", true)];
    let mut transitions = Vec::with_capacity(n);
    let mut arcs = Vec::with_capacity(2 * n);

    for i in 1..=n {
        places.push(PlaceSpec::new(format!("p{i}"), false));
        transitions.push(TransitionSpec::new(format!("t{i}")));
        arcs.push(ArcSpec::enabler(
            Endpoint::place(i - 1),
            Endpoint::transition(i - 1),
        ));
        arcs.push(ArcSpec::enabler(Endpoint::transition(i - 1), Endpoint::place(i)));
    }

    (places, transitions, arcs)
}

/// Binary conflict tree of the given depth with a marked root place.
///
/// Every inner place feeds a left and a right transition; each firing
/// moves the single token one level down, so the reachable markings are
/// exactly the tree nodes and every leaf is a deadlock. Labels are unique
/// per transition, so no bus synchronization is introduced.
pub fn fork(depth: usize) -> Topology {
    let mut places = vec![PlaceSpec::new("root", true)];
    let mut transitions = Vec::new();
    let mut arcs = Vec::new();

    // (place index, remaining depth), breadth-first
    let mut frontier = std::collections::VecDeque::from([(0usize, depth)]);
    let mut splits = 0usize;
    while let Some((parent, d)) = frontier.pop_front() {
        if d == 0 {
            continue;
        }
        splits += 1;
        for side in ["L", "R"] {
            let t = transitions.len();
            transitions.push(TransitionSpec::new(format!("fork_t{splits}_{side}")));
            let p = places.len();
            places.push(PlaceSpec::new(format!("p{splits}_{side}"), false));
            arcs.push(ArcSpec::enabler(Endpoint::place(parent), Endpoint::transition(t)));
            arcs.push(ArcSpec::enabler(Endpoint::transition(t), Endpoint::place(p)));
            frontier.push_back((p, d - 1));
        }
    }

    (places, transitions, arcs)
}
