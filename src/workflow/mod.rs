//! Workflow state machine for issues.
//!
//! Thirteen states with a fixed transition table, a happy-path advance map,
//! and evidence gates on the transitions that leave a working state.

pub mod events;

use crate::models::Status;

/// Valid transitions out of a given state.
pub fn next_states(from: Status) -> &'static [Status] {
    use Status::*;
    match from {
        Backlog => &[Todo],
        Todo => &[InProgress, Backlog],
        InProgress => &[ReadyForTesting, Blocked, Todo],
        Blocked => &[InProgress, Todo],
        ReadyForTesting => &[InTesting, InProgress],
        InTesting => &[ReadyForDocs, InProgress],
        ReadyForDocs => &[InDocs, InTesting],
        InDocs => &[Documented, ReadyForDocs],
        Documented => &[InReview],
        InReview => &[Done, Rejected, Documented],
        Done => &[Todo],
        Rejected => &[Todo, Backlog],
        Cancelled => &[Backlog],
    }
}

/// Whether transitioning `from -> to` is allowed.
pub fn is_valid(from: Status, to: Status) -> bool {
    next_states(from).contains(&to)
}

/// Terminal states that count as resolved.
pub fn is_completed(status: Status) -> bool {
    matches!(status, Status::Done | Status::Rejected | Status::Cancelled)
}

/// States where work finished successfully.
pub fn is_done(status: Status) -> bool {
    status == Status::Done
}

/// States where an agent is actively working.
pub fn is_active(status: Status) -> bool {
    matches!(
        status,
        Status::InProgress | Status::InTesting | Status::InDocs | Status::InReview
    )
}

/// States waiting for the next stage to pick the issue up.
pub fn is_waiting(status: Status) -> bool {
    matches!(
        status,
        Status::ReadyForTesting | Status::ReadyForDocs | Status::Documented
    )
}

/// The happy-path successor used by `advance_task`, if one exists.
pub fn advance_target(from: Status) -> Option<Status> {
    use Status::*;
    match from {
        InProgress => Some(ReadyForTesting),
        ReadyForTesting => Some(InTesting),
        InTesting => Some(ReadyForDocs),
        ReadyForDocs => Some(InDocs),
        InDocs => Some(Documented),
        Documented => Some(InReview),
        InReview => Some(Done),
        _ => None,
    }
}

/// The evidence requirement for leaving a gated state, if any.
///
/// Advancing out of these states is refused unless the caller supplies a
/// non-empty `evidence` string describing the work done.
pub fn gate_requirement(from: Status) -> Option<&'static str> {
    match from {
        Status::InProgress => Some(
            "tests_passed: Run tests and confirm all pass. Include test command and results summary.",
        ),
        Status::InTesting => {
            Some("tests_verified: Confirm coverage is acceptable and edge cases are covered.")
        }
        Status::InDocs => Some("docs_written: Describe what documentation was added or updated."),
        Status::InReview => {
            Some("review_approved: Describe what was reviewed and confirm code quality.")
        }
        _ => None,
    }
}

/// What the agent should do at a stage before the next advance, if the
/// stage is itself pre-gated.
pub fn gate_hint(at: Status) -> Option<&'static str> {
    match at {
        Status::ReadyForTesting => Some(
            "ACTION REQUIRED: Run tests (use qa-go/qa-rust/qa-node agent). Provide test results as evidence when advancing.",
        ),
        Status::InTesting => Some(
            "ACTION REQUIRED: Verify test coverage and edge cases. Provide verification summary as evidence.",
        ),
        Status::ReadyForDocs => Some(
            "ACTION REQUIRED: Write or update documentation for this task. Provide docs summary as evidence.",
        ),
        Status::InDocs => {
            Some("ACTION REQUIRED: Finalize documentation. Provide summary as evidence when advancing.")
        }
        Status::Documented => Some(
            "ACTION REQUIRED: Review code quality, patterns, security, error handling. Provide review findings as evidence.",
        ),
        Status::InReview => {
            Some("ACTION REQUIRED: Final review and approval. Provide approval summary as evidence.")
        }
        _ => None,
    }
}

/// Render the valid targets of a state for error messages: `a, b, c`.
pub fn next_states_label(from: Status) -> String {
    next_states(from)
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use Status::*;

    #[test]
    fn test_declared_transitions() {
        assert!(is_valid(Backlog, Todo));
        assert!(is_valid(Todo, InProgress));
        assert!(is_valid(InProgress, ReadyForTesting));
        assert!(is_valid(InProgress, Blocked));
        assert!(is_valid(Blocked, InProgress));
        assert!(is_valid(ReadyForTesting, InTesting));
        assert!(is_valid(InTesting, ReadyForDocs));
        assert!(is_valid(ReadyForDocs, InDocs));
        assert!(is_valid(InDocs, Documented));
        assert!(is_valid(Documented, InReview));
        assert!(is_valid(InReview, Done));
        assert!(is_valid(InReview, Rejected));
        assert!(is_valid(Done, Todo));
        assert!(is_valid(Rejected, Backlog));
        assert!(is_valid(Cancelled, Backlog));
    }

    #[test]
    fn test_undeclared_transitions_rejected() {
        assert!(!is_valid(Backlog, InProgress));
        assert!(!is_valid(Backlog, Done));
        assert!(!is_valid(Todo, Done));
        assert!(!is_valid(InProgress, Done));
        assert!(!is_valid(Done, Backlog));
        assert!(!is_valid(Documented, Done));
        assert!(!is_valid(Rejected, Done));
    }

    #[test]
    fn test_every_target_is_a_known_state() {
        for from in Status::ALL {
            for to in next_states(from) {
                assert!(Status::ALL.contains(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_predicates() {
        for s in [Done, Rejected, Cancelled] {
            assert!(is_completed(s));
        }
        assert!(!is_completed(InReview));
        assert!(is_done(Done));
        assert!(!is_done(Rejected));
        for s in [InProgress, InTesting, InDocs, InReview] {
            assert!(is_active(s));
        }
        for s in [ReadyForTesting, ReadyForDocs, Documented] {
            assert!(is_waiting(s));
        }
        assert!(!is_active(Todo));
        assert!(!is_waiting(Todo));
    }

    #[test]
    fn test_advance_map_reaches_done() {
        let mut status = InProgress;
        let mut hops = 0;
        while let Some(next) = advance_target(status) {
            assert!(is_valid(status, next), "{} -> {}", status, next);
            status = next;
            hops += 1;
        }
        assert_eq!(status, Done);
        assert_eq!(hops, 7);
    }

    #[test]
    fn test_advance_map_undefined_states() {
        for s in [Backlog, Todo, Blocked, Done, Rejected, Cancelled] {
            assert!(advance_target(s).is_none(), "{} should not advance", s);
        }
    }

    #[test]
    fn test_gates_cover_active_states() {
        for s in [InProgress, InTesting, InDocs, InReview] {
            assert!(gate_requirement(s).is_some(), "{} should be gated", s);
        }
        for s in [ReadyForTesting, ReadyForDocs, Documented, Todo] {
            assert!(gate_requirement(s).is_none(), "{} should be free", s);
        }
    }

    #[test]
    fn test_gate_hints_on_advance_targets() {
        // Every advance target short of done carries a hint for what to do next.
        let mut status = InProgress;
        while let Some(next) = advance_target(status) {
            if next != Done {
                assert!(gate_hint(next).is_some(), "{} needs a hint", next);
            }
            status = next;
        }
    }

    #[test]
    fn test_next_states_label() {
        assert_eq!(next_states_label(Documented), "in-review");
        assert_eq!(next_states_label(InReview), "done, rejected, documented");
    }
}
