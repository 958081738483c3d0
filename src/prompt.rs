// prompt.rs

/// Identity preamble every role prepends to its prompts.
pub fn role_prefix(name: &str, profile: &str, goal: &str, constraints: &str) -> String {
    format!(
        "You are a {}, named {}, your goal is {}, and the constraint is {}. ",
        profile, name, goal, constraints
    )
}

/// Stage-selection prompt for the think step: conversation records plus the
/// enumerated action states, answered with a bare index.
pub fn stage_select(history: &str, states: &str, n_states: usize) -> String {
    format!(
        "Here are your conversation records. You can decide which stage you \
         should enter or stay in based on these records.\n\
         ===\n{}\n===\n\n\
         You can now choose one of the following stages for your next step:\n{}\n\n\
         Just answer a number between 0-{}, choosing the most suitable stage \
         for the current conversation. If there is no conversation record, \
         choose 0. Answer with the number only, do not add any other text.",
        history,
        states,
        n_states.saturating_sub(1)
    )
}

pub const WRITE_SPEC: &str = "Write a concise requirement document for the \
goal under discussion: user stories, a prioritized feature list, and \
acceptance criteria.";

pub const WRITE_DESIGN: &str = "Based on the requirement document, write a \
concise technical design: data structures, module boundaries, and the \
interfaces between them.";

pub const WRITE_CODE: &str = "Based on the design and any test reports, \
implement the next increment of code. Output complete, runnable code, not \
fragments.";

pub const FIX_BUG: &str = "A test report flagged problems. Diagnose the \
failures it describes and output the corrected code.";

pub const WRITE_TESTS: &str = "Review the latest code and write a test \
report: what you exercised, what passed, and any defects found. If you can, \
answer as a JSON object with \"passed\" and \"defects\" fields.";

pub const RESPOND: &str = "Reply helpfully to the conversation, staying \
within your role.";
