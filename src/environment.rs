// environment.rs
use crate::memory::{self, SharedMemory};
use crate::message::Message;
use crate::role::Role;
use cli_log::info;
use color_eyre::eyre::Result;
use colored::Colorize;
use std::collections::HashMap;

/// Shared bus: the global message history plus the registry of roles keyed
/// by profile. Delivery is pull-based: publishing only appends to the
/// global memory, and each role reads the backlog on its own next observe,
/// so a publisher never interrupts a role mid-turn.
pub struct Environment {
    roles: HashMap<String, Role>,
    order: Vec<String>,
    memory: SharedMemory,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
            order: Vec::new(),
            memory: memory::shared(),
        }
    }

    /// Registers a role under its profile and hands it the shared memory so
    /// it can publish back. Re-registering a profile overwrites the entry
    /// but keeps its original turn position.
    pub fn add_role(&mut self, mut role: Role) {
        role.set_env(SharedMemory::clone(&self.memory));
        let key = role.profile().to_string();
        if !self.roles.contains_key(&key) {
            self.order.push(key.clone());
        }
        info!("registered role {} as {:?}", role.name(), key);
        self.roles.insert(key, role);
    }

    pub fn add_roles(&mut self, roles: impl IntoIterator<Item = Role>) {
        for role in roles {
            self.add_role(role);
        }
    }

    pub fn get_role(&self, profile: &str) -> Option<&Role> {
        self.roles.get(profile)
    }

    pub fn get_roles(&self) -> &HashMap<String, Role> {
        &self.roles
    }

    /// Appends to the global history and echoes the message for the
    /// operator. Roles see it on their next observe.
    pub fn publish_message(&self, message: Message) {
        print_message(&message);
        self.memory
            .write()
            .expect("environment memory lock poisoned")
            .add(message);
    }

    /// Snapshot of the global history.
    pub fn history(&self) -> Vec<Message> {
        self.memory
            .read()
            .expect("environment memory lock poisoned")
            .get()
    }

    /// Drives every registered role once per round, in registration order,
    /// each turn running to completion before the next starts. A role
    /// error ends the session.
    pub async fn run(&mut self, rounds: usize) -> Result<()> {
        for round in 1..=rounds {
            info!("round {}/{}", round, rounds);
            for key in self.order.clone() {
                let Some(role) = self.roles.get_mut(&key) else {
                    continue;
                };
                if let Some(response) = role.run(None).await? {
                    print_message(&response);
                }
            }
        }
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn print_message(message: &Message) {
    let speaker = if message.sent_from.is_empty() {
        message.role.clone()
    } else {
        message.sent_from.clone()
    };
    println!(
        "{} {} {}",
        message.timestamp.format("[%H:%M:%S]").to_string().dimmed(),
        format!("{}:", speaker).blue().bold(),
        message.content
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionOutput, USER_REQUIREMENT};
    use crate::role::{Decider, RoleSetting};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct FixedDecider;

    #[async_trait]
    impl Decider for FixedDecider {
        async fn decide(&self, _prompt: &str) -> Result<String> {
            Ok("0".to_string())
        }
    }

    struct RelayAction {
        kind: &'static str,
    }

    #[async_trait]
    impl Action for RelayAction {
        fn kind(&self) -> &str {
            self.kind
        }

        async fn run(
            &self,
            context: &[Message],
            _options: &HashMap<String, String>,
        ) -> Result<ActionOutput> {
            Ok(ActionOutput::from(format!("relayed {}", context.len())))
        }
    }

    fn relay_role(name: &str, profile: &str, kind: &'static str, watch: &[&str]) -> Role {
        Role::new(
            RoleSetting::new(name, profile, "relay messages", "none"),
            Arc::new(FixedDecider),
        )
        .with_actions(vec![Arc::new(RelayAction { kind })])
        .with_watch(watch.iter().copied())
    }

    #[test]
    fn roles_are_registered_by_profile() {
        let mut env = Environment::new();
        env.add_role(relay_role("Alice", "pm", "RelayA", &[USER_REQUIREMENT]));
        env.add_role(relay_role("Bob", "dev", "RelayB", &[]));

        assert_eq!(env.get_role("pm").unwrap().name(), "Alice");
        assert_eq!(env.get_roles().len(), 2);
        assert!(env.get_role("qa").is_none());
    }

    #[test]
    fn reregistering_a_profile_overwrites_the_entry() {
        let mut env = Environment::new();
        env.add_role(relay_role("Alice", "pm", "RelayA", &[]));
        env.add_role(relay_role("Alma", "pm", "RelayA", &[]));

        assert_eq!(env.get_roles().len(), 1);
        assert_eq!(env.get_role("pm").unwrap().name(), "Alma");
    }

    #[tokio::test]
    async fn watched_traffic_reaches_the_watcher_only() {
        let mut env = Environment::new();
        env.add_role(relay_role("Alice", "watcher", "RelayA", &["Seed"]));
        env.add_role(relay_role("Bob", "bystander", "RelayB", &[]));

        env.publish_message(Message::new("x").with_cause_by("Seed"));
        env.run(1).await.unwrap();

        // the watcher reacted: seed plus its response
        let history = env.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].cause_by, "RelayA");
        assert_eq!(history[1].sent_from, "Alice");
        // the bystander saw no news and stayed idle, but mirrored traffic
        let bystander = env.get_role("bystander").unwrap();
        assert!(bystander.news().is_empty());
        assert!(!bystander.history().is_empty());
    }

    #[tokio::test]
    async fn a_quiet_round_publishes_nothing() {
        let mut env = Environment::new();
        env.add_role(relay_role("Alice", "watcher", "RelayA", &["Seed"]));
        env.run(1).await.unwrap();
        assert!(env.history().is_empty());
    }

    #[tokio::test]
    async fn responses_cascade_down_the_turn_order() {
        // pm reacts to the requirement; dev, whose turn comes after, sees
        // the pm's output on its own observe within the same round.
        let mut env = Environment::new();
        env.add_role(relay_role("Alice", "pm", "Draft", &[USER_REQUIREMENT]));
        env.add_role(relay_role("Bob", "dev", "Build", &["Draft"]));

        env.publish_message(Message::new("make a game"));
        env.run(2).await.unwrap();

        let kinds: Vec<String> = env.history().into_iter().map(|m| m.cause_by).collect();
        assert_eq!(kinds, vec![USER_REQUIREMENT, "Draft", "Build"]);
    }
}
