// role.rs
use crate::action::Action;
use crate::memory::{Memory, SharedMemory};
use crate::message::Message;
use crate::prompt;
use crate::state::{parse_decision, Decision, RolePhase};
use async_trait::async_trait;
use cli_log::{debug, info, warn};
use color_eyre::eyre::{eyre, Result};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

lazy_static! {
    static ref DEFAULT_OPTIONS: HashMap<String, String> = {
        let mut options = HashMap::new();
        options.insert("language".to_string(), "English".to_string());
        options
    };
}

/// Decision procedure consulted by `think` when a role has more than one
/// action: given the history and the enumerated stages, it returns free
/// text that is parsed leniently into a stage index.
#[async_trait]
pub trait Decider: Send + Sync {
    async fn decide(&self, prompt: &str) -> Result<String>;
}

/// Explicit input handed to `run`, folded into memory without an observe
/// pass.
pub enum RoleInput {
    Text(String),
    Message(Message),
    Batch(Vec<Message>),
}

/// Identity of a role: who it is, what it wants, what binds it.
#[derive(Debug, Clone)]
pub struct RoleSetting {
    pub name: String,
    pub profile: String,
    pub goal: String,
    pub constraints: String,
    pub desc: String,
}

impl RoleSetting {
    pub fn new(
        name: impl Into<String>,
        profile: impl Into<String>,
        goal: impl Into<String>,
        constraints: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            profile: profile.into(),
            goal: goal.into(),
            constraints: constraints.into(),
            desc: String::new(),
        }
    }

    /// The prompt preamble: `desc` verbatim when set, otherwise the
    /// rendered identity template.
    pub fn prefix(&self) -> String {
        if !self.desc.is_empty() {
            return self.desc.clone();
        }
        prompt::role_prefix(&self.name, &self.profile, &self.goal, &self.constraints)
    }
}

impl fmt::Display for RoleSetting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, self.profile)
    }
}

/// An autonomous agent: an ordered action list, a watch set, private
/// memory, and the observe→think→act cycle over them.
pub struct Role {
    setting: RoleSetting,
    actions: Vec<Arc<dyn Action>>,
    states: Vec<String>,
    watch: HashSet<String>,
    state: usize,
    phase: RolePhase,
    memory: Memory,
    news: Vec<Message>,
    env: Option<SharedMemory>,
    decider: Arc<dyn Decider>,
    options: HashMap<String, String>,
}

impl Role {
    pub fn new(setting: RoleSetting, decider: Arc<dyn Decider>) -> Self {
        Self {
            setting,
            actions: Vec::new(),
            states: Vec::new(),
            watch: HashSet::new(),
            state: 0,
            phase: RolePhase::Idle,
            memory: Memory::new(),
            news: Vec::new(),
            env: None,
            decider,
            options: DEFAULT_OPTIONS.clone(),
        }
    }

    /// Installs the ordered action list; the indices are the role's state
    /// space and the enumerated listing is what the decider chooses from.
    pub fn with_actions(mut self, actions: Vec<Arc<dyn Action>>) -> Self {
        self.states = actions
            .iter()
            .enumerate()
            .map(|(index, action)| format!("{}. {}", index, action.kind()))
            .collect();
        self.actions = actions;
        self.state = 0;
        self
    }

    pub fn with_watch<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watch.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Called by the environment on registration so the role can publish
    /// back to the shared memory.
    pub fn set_env(&mut self, env: SharedMemory) {
        self.env = Some(env);
    }

    pub fn name(&self) -> &str {
        &self.setting.name
    }

    pub fn profile(&self) -> &str {
        &self.setting.profile
    }

    pub fn setting(&self) -> &RoleSetting {
        &self.setting
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn phase(&self) -> RolePhase {
        self.phase
    }

    pub fn news(&self) -> &[Message] {
        &self.news
    }

    pub fn watch(&self) -> &HashSet<String> {
        &self.watch
    }

    pub fn history(&self) -> Vec<Message> {
        self.memory.get()
    }

    /// Messages caused by watched action kinds; the context handed to the
    /// current action.
    pub fn important_memory(&self) -> Vec<Message> {
        self.memory.get_by_actions(&self.watch)
    }

    fn todo(&self) -> Arc<dyn Action> {
        Arc::clone(&self.actions[self.state])
    }

    fn set_state(&mut self, state: usize) {
        self.state = state;
    }

    /// Adds a message to private memory; duplicates are absorbed.
    pub fn recv(&mut self, message: Message) {
        self.memory.add(message);
    }

    fn recv_input(&mut self, input: RoleInput) {
        match input {
            RoleInput::Text(text) => self.recv(Message::user(text)),
            RoleInput::Message(message) => self.recv(message),
            RoleInput::Batch(batch) => {
                for message in batch {
                    self.recv(message);
                }
            }
        }
    }

    /// Pulls from the attached environment. News is the watched, novel
    /// subset; every message on the bus is mirrored into private memory
    /// verbatim so the full conversation stays recallable. Returns the news
    /// count; zero without an environment.
    pub fn observe(&mut self) -> usize {
        self.news.clear();
        let Some(env) = &self.env else {
            return 0;
        };
        let env_messages = env.read().expect("environment memory lock poisoned").get();
        self.news = env_messages
            .iter()
            .filter(|m| self.watch.contains(&m.cause_by) && !self.memory.contains(m))
            .cloned()
            .collect();
        for message in env_messages {
            self.memory.add(message);
        }
        if !self.news.is_empty() {
            debug!(
                "{}: observed {} new message(s)",
                self.setting,
                self.news.len()
            );
        }
        self.news.len()
    }

    /// Selects the next action. A single-action role is pinned to state 0;
    /// otherwise the decider picks from the enumerated stages and anything
    /// unparseable degrades to state 0 rather than blocking the loop.
    pub async fn think(&mut self) -> Result<()> {
        if self.actions.is_empty() {
            return Err(eyre!("{} has no actions to choose from", self.setting));
        }
        self.phase = RolePhase::Thinking;
        if self.actions.len() == 1 {
            self.set_state(0);
            return Ok(());
        }
        let history = self
            .memory
            .get()
            .iter()
            .map(Message::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{}{}",
            self.setting.prefix(),
            prompt::stage_select(&history, &self.states.join("\n"), self.states.len())
        );
        let reply = self.decider.decide(&prompt).await?;
        match parse_decision(&reply, self.actions.len()) {
            Decision::Chosen(index) => self.set_state(index),
            Decision::Invalid => {
                warn!(
                    "{}: invalid stage reply {:?}, falling back to 0",
                    self.setting, reply
                );
                self.set_state(0);
            }
        }
        Ok(())
    }

    /// Runs the selected action against the important memory and wraps the
    /// result into an attributed message, remembered before it is returned.
    pub async fn act(&mut self) -> Result<Message> {
        self.phase = RolePhase::Acting;
        let todo = self.todo();
        info!("{}: ready to {}", self.setting, todo.kind());

        let context = self.important_memory();
        let mut options = self.options.clone();
        options.insert("prefix".to_string(), self.setting.prefix());
        let output = todo.run(&context, &options).await?;

        let message = Message::new(output.content)
            .with_structured(output.structured_content)
            .with_role(self.setting.profile.as_str())
            .with_cause_by(todo.kind())
            .with_sent_from(self.setting.name.as_str());
        self.memory.add(message.clone());
        self.phase = RolePhase::Idle;
        Ok(message)
    }

    /// Think, then act: one unit of role progress.
    pub async fn react(&mut self) -> Result<Message> {
        self.think().await?;
        debug!("{}: state {}, will act", self.setting, self.state);
        self.act().await
    }

    /// One turn. Explicit input skips observation; otherwise a turn with
    /// zero news goes idle, so a role never re-reacts to stale state. The
    /// response is published to the environment when one is attached.
    pub async fn run(&mut self, input: Option<RoleInput>) -> Result<Option<Message>> {
        match input {
            Some(input) => self.recv_input(input),
            None => {
                if self.observe() == 0 {
                    debug!("{}: no news, waiting", self.setting);
                    return Ok(None);
                }
            }
        }
        let response = self.react().await?;
        if let Some(env) = &self.env {
            env.write()
                .expect("environment memory lock poisoned")
                .add(response.clone());
        }
        Ok(Some(response))
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Role({}, state={}, phase={})",
            self.setting, self.state, self.phase
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionOutput, USER_REQUIREMENT};
    use crate::memory;

    struct ScriptedDecider {
        reply: String,
    }

    #[async_trait]
    impl Decider for ScriptedDecider {
        async fn decide(&self, _prompt: &str) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct EchoAction {
        kind: &'static str,
    }

    #[async_trait]
    impl Action for EchoAction {
        fn kind(&self) -> &str {
            self.kind
        }

        async fn run(
            &self,
            context: &[Message],
            _options: &HashMap<String, String>,
        ) -> Result<ActionOutput> {
            Ok(ActionOutput::from(format!("echo:{}", context.len())))
        }
    }

    fn test_role(n_actions: usize, decider_reply: &str) -> Role {
        let actions: Vec<Arc<dyn Action>> = match n_actions {
            1 => vec![Arc::new(EchoAction { kind: "Echo" })],
            _ => vec![
                Arc::new(EchoAction { kind: "Echo" }),
                Arc::new(EchoAction { kind: "Relay" }),
                Arc::new(EchoAction { kind: "Report" }),
            ],
        };
        Role::new(
            RoleSetting::new("Testa", "tester", "test things", "none"),
            Arc::new(ScriptedDecider {
                reply: decider_reply.to_string(),
            }),
        )
        .with_actions(actions)
        .with_watch([USER_REQUIREMENT])
    }

    #[tokio::test]
    async fn single_action_role_always_selects_state_zero() {
        let mut role = test_role(1, "5");
        role.think().await.unwrap();
        assert_eq!(role.state(), 0);
    }

    #[tokio::test]
    async fn out_of_range_reply_falls_back_to_state_zero() {
        let mut role = test_role(3, "7");
        role.think().await.unwrap();
        assert_eq!(role.state(), 0);
    }

    #[tokio::test]
    async fn valid_reply_selects_that_state() {
        let mut role = test_role(3, "2");
        role.think().await.unwrap();
        assert_eq!(role.state(), 2);
    }

    #[tokio::test]
    async fn prose_reply_falls_back_to_state_zero() {
        let mut role = test_role(3, "I think stage 2 fits best");
        role.think().await.unwrap();
        assert_eq!(role.state(), 0);
    }

    #[tokio::test]
    async fn run_without_news_goes_idle() {
        let mut role = test_role(1, "0");
        let response = role.run(None).await.unwrap();
        assert!(response.is_none());
        assert!(role.history().is_empty());
    }

    #[tokio::test]
    async fn observe_counts_watched_novel_messages_only() {
        let bus = memory::shared();
        bus.write()
            .unwrap()
            .add(Message::new("x").with_cause_by(USER_REQUIREMENT));

        let mut watcher = test_role(1, "0");
        watcher.set_env(Arc::clone(&bus));
        assert_eq!(watcher.observe(), 1);
        // already remembered, so a second observe yields no news
        assert_eq!(watcher.observe(), 0);

        let mut bystander = Role::new(
            RoleSetting::new("Bysta", "bystander", "watch nothing", "none"),
            Arc::new(ScriptedDecider {
                reply: "0".to_string(),
            }),
        )
        .with_actions(vec![Arc::new(EchoAction { kind: "Echo" })]);
        bystander.set_env(Arc::clone(&bus));
        assert_eq!(bystander.observe(), 0);
        // unwatched traffic is still mirrored into private memory
        assert_eq!(bystander.history().len(), 1);
    }

    #[tokio::test]
    async fn react_attributes_and_publishes_the_response() {
        let bus = memory::shared();
        bus.write().unwrap().add(Message::new("build a thing"));

        let mut role = test_role(1, "0");
        role.set_env(Arc::clone(&bus));
        let response = role.run(None).await.unwrap().expect("role had news");

        assert_eq!(response.role, "tester");
        assert_eq!(response.cause_by, "Echo");
        assert_eq!(response.sent_from, "Testa");
        assert_eq!(response.content, "echo:1");
        assert!(response
            .send_to()
            .contains(crate::message::BROADCAST));
        // published to the bus and remembered privately
        assert_eq!(bus.read().unwrap().len(), 2);
        assert!(role.history().contains(&response));
        assert_eq!(role.phase(), RolePhase::Idle);
    }

    #[tokio::test]
    async fn explicit_input_bypasses_observation() {
        let mut role = test_role(1, "0");
        let response = role
            .run(Some(RoleInput::Text("direct request".to_string())))
            .await
            .unwrap();
        assert!(response.is_some());
        // the folded input plus the produced response
        assert_eq!(role.history().len(), 2);
    }

    #[tokio::test]
    async fn batch_input_is_folded_in_order() {
        let mut role = test_role(1, "0");
        let batch = vec![Message::new("one"), Message::new("two")];
        role.run(Some(RoleInput::Batch(batch))).await.unwrap();
        let contents: Vec<String> = role
            .history()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents[..2], ["one".to_string(), "two".to_string()]);
    }
}
