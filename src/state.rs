// state.rs
use std::fmt;

/// Coarse activity state of a role, for status lines and logs. The real
/// state machine is the index into the role's action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePhase {
    /// Waiting for news.
    Idle,

    /// Selecting the next action.
    Thinking,

    /// Running the selected action.
    Acting,
}

impl fmt::Display for RolePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let phase = match self {
            RolePhase::Idle => "Idle",
            RolePhase::Thinking => "Thinking",
            RolePhase::Acting => "Acting",
        };
        write!(f, "{}", phase)
    }
}

/// Outcome of parsing a stage-selection reply. The invalid branch is
/// explicit rather than an exception swallowed on the way to a default, so
/// the fallback stays visible and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Chosen(usize),
    Invalid,
}

/// Accepts a plain non-negative integer literal inside `0..n_states`;
/// anything else (signs, decorations, prose, out-of-range indices) is
/// invalid. Surrounding whitespace is tolerated since model replies tend to
/// carry it.
pub fn parse_decision(raw: &str, n_states: usize) -> Decision {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Decision::Invalid;
    }
    match trimmed.parse::<usize>() {
        Ok(index) if index < n_states => Decision::Chosen(index),
        _ => Decision::Invalid,
    }
}

#[test]
fn test_in_range_literal_is_chosen() {
    assert_eq!(parse_decision("2", 3), Decision::Chosen(2));
    assert_eq!(parse_decision(" 1 \n", 3), Decision::Chosen(1));
    assert_eq!(parse_decision("0", 1), Decision::Chosen(0));
}

#[test]
fn test_out_of_range_is_invalid() {
    assert_eq!(parse_decision("7", 3), Decision::Invalid);
    assert_eq!(parse_decision("3", 3), Decision::Invalid);
}

#[test]
fn test_decorated_or_textual_replies_are_invalid() {
    assert_eq!(parse_decision("+1", 3), Decision::Invalid);
    assert_eq!(parse_decision("2.", 3), Decision::Invalid);
    assert_eq!(parse_decision("two", 3), Decision::Invalid);
    assert_eq!(parse_decision("", 3), Decision::Invalid);
    assert_eq!(parse_decision("state 1", 3), Decision::Invalid);
}
