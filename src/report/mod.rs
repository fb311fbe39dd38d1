use std::fmt;
use std::time::Duration;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A state with no ready bus group at the time of its discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlockState {
    pub state_id: String,
    pub marking: Vec<(String, bool)>,
}

/// Summary of one state-space exploration.
///
/// `truncated` distinguishes "state budget exhausted" from "no more
/// reachable states"; a truncated report never claims completeness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub state_count: usize,
    pub path_count: usize,
    pub deadlock_states: Vec<DeadlockState>,
    pub analysis_time: Duration,
    pub truncated: bool,
}

impl AnalysisReport {
    pub fn deadlock_count(&self) -> usize {
        self.deadlock_states.len()
    }

    pub fn has_deadlock(&self) -> bool {
        !self.deadlock_states.is_empty()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "analysis summary")?;
        writeln!(f, "unique states: {}", self.state_count)?;
        writeln!(f, "unique paths:  {}", self.path_count)?;
        writeln!(f, "elapsed:       {:?}", self.analysis_time)?;
        if self.truncated {
            writeln!(f, "state budget exhausted: the graph is partial")?;
        }
        if self.deadlock_states.is_empty() {
            writeln!(f, "deadlocks:     none (net is live or cyclic)")?;
        } else {
            writeln!(f, "deadlocks:     {} detected", self.deadlock_count())?;
            for state in &self.deadlock_states {
                let marking = state
                    .marking
                    .iter()
                    .map(|(name, marked)| format!("{name}: {marked}"))
                    .join(", ");
                writeln!(f, "  - {}: {}", state.state_id, marking)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> AnalysisReport {
        AnalysisReport {
            state_count: 3,
            path_count: 2,
            deadlock_states: vec![DeadlockState {
                state_id: "s2".to_string(),
                marking: vec![("p1".to_string(), false), ("p2".to_string(), true)],
            }],
            analysis_time: Duration::from_millis(5),
            truncated: false,
        }
    }

    #[test]
    fn display_lists_deadlocks() {
        let text = report().to_string();
        assert!(text.contains("unique states: 3"));
        assert!(text.contains("s2: p1: false, p2: true"));
        assert!(!text.contains("partial"));
    }

    #[test]
    fn serializes_to_json_and_back() {
        let report = report();
        let json = crate::net::io::to_json_string(&report).unwrap();
        let back: AnalysisReport = crate::net::io::from_json_str(&json).unwrap();
        assert_eq!(back.state_count, report.state_count);
        assert_eq!(back.deadlock_states, report.deadlock_states);
        assert_eq!(back.truncated, report.truncated);
    }
}
