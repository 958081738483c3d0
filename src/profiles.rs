// profiles.rs
use crate::action::{LlmAction, USER_REQUIREMENT};
use crate::config::RoleConfig;
use crate::llm::Llm;
use crate::prompt;
use crate::role::{Decider, Role, RoleSetting};
use std::sync::Arc;

// Action kinds the built-in team publishes and watches.
pub const WRITE_SPEC: &str = "WriteSpec";
pub const WRITE_DESIGN: &str = "WriteDesign";
pub const WRITE_CODE: &str = "WriteCode";
pub const FIX_BUG: &str = "FixBug";
pub const WRITE_TESTS: &str = "WriteTests";
pub const RESPOND: &str = "Respond";

/// Builds a role from a configured preset. Unknown presets fall back to a
/// single-action generalist that answers operator requirements.
pub fn build_role(config: &RoleConfig, llm: &Llm) -> Role {
    let decider: Arc<dyn Decider> = Arc::new(llm.clone());
    let name = config.name.as_str();
    match config.preset.as_str() {
        "product_manager" => Role::new(
            RoleSetting::new(
                name,
                "product manager",
                "turn the requirement into a concise, prioritized requirement document",
                "stay within what was asked for",
            ),
            decider,
        )
        .with_actions(vec![Arc::new(LlmAction::new(
            WRITE_SPEC,
            prompt::WRITE_SPEC,
            llm.clone(),
        ))])
        .with_watch([USER_REQUIREMENT]),

        "architect" => Role::new(
            RoleSetting::new(
                name,
                "architect",
                "design a usable, efficient system for the requirement document",
                "keep the design as simple as the requirements allow",
            ),
            decider,
        )
        .with_actions(vec![Arc::new(LlmAction::new(
            WRITE_DESIGN,
            prompt::WRITE_DESIGN,
            llm.clone(),
        ))])
        .with_watch([WRITE_SPEC]),

        // Two actions: the decision procedure picks between fresh code and
        // bug fixing based on the conversation.
        "engineer" => Role::new(
            RoleSetting::new(
                name,
                "engineer",
                "implement the design and keep the code passing review",
                "write complete, runnable code",
            ),
            decider,
        )
        .with_actions(vec![
            Arc::new(LlmAction::new(WRITE_CODE, prompt::WRITE_CODE, llm.clone())),
            Arc::new(LlmAction::new(FIX_BUG, prompt::FIX_BUG, llm.clone())),
        ])
        .with_watch([WRITE_DESIGN, WRITE_TESTS]),

        "qa" => Role::new(
            RoleSetting::new(
                name,
                "qa engineer",
                "review the latest code and report defects",
                "be specific about what was exercised",
            ),
            decider,
        )
        .with_actions(vec![Arc::new(LlmAction::new(
            WRITE_TESTS,
            prompt::WRITE_TESTS,
            llm.clone(),
        ))])
        .with_watch([WRITE_CODE, FIX_BUG]),

        other => Role::new(
            RoleSetting::new(
                name,
                other,
                "contribute to the conversation",
                "stay within your role",
            ),
            decider,
        )
        .with_actions(vec![Arc::new(LlmAction::new(
            RESPOND,
            prompt::RESPOND,
            llm.clone(),
        ))])
        .with_watch([USER_REQUIREMENT]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config(name: &str, preset: &str) -> RoleConfig {
        RoleConfig {
            name: name.to_string(),
            preset: preset.to_string(),
        }
    }

    #[test]
    fn presets_wire_the_pipeline_watches() {
        let llm = Llm::new(None);

        let pm = build_role(&config("Alice", "product_manager"), &llm);
        assert_eq!(pm.profile(), "product manager");
        assert_eq!(pm.watch(), &HashSet::from([USER_REQUIREMENT.to_string()]));

        let architect = build_role(&config("Bob", "architect"), &llm);
        assert_eq!(
            architect.watch(),
            &HashSet::from([WRITE_SPEC.to_string()])
        );

        let qa = build_role(&config("Dana", "qa"), &llm);
        assert_eq!(
            qa.watch(),
            &HashSet::from([WRITE_CODE.to_string(), FIX_BUG.to_string()])
        );
    }

    #[test]
    fn unknown_preset_builds_a_generalist() {
        let llm = Llm::new(None);
        let role = build_role(&config("Eve", "poet"), &llm);
        assert_eq!(role.profile(), "poet");
        assert_eq!(role.watch(), &HashSet::from([USER_REQUIREMENT.to_string()]));
    }
}
