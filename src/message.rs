// message.rs
use crate::action::USER_REQUIREMENT;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Reserved recipient meaning "all current and future roles".
pub const BROADCAST: &str = "<all>";

/// Addressed unit of communication between roles.
///
/// Routing metadata is normalized once, at construction: the id is generated
/// when none is supplied and cannot be reassigned, an empty `cause_by`
/// becomes the user-requirement sentinel, and an empty recipient set becomes
/// the broadcast wildcard.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    pub content: String,
    pub structured_content: Option<Value>,
    pub role: String,
    pub cause_by: String,
    pub sent_from: String,
    send_to: HashSet<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            structured_content: None,
            role: "user".to_string(),
            cause_by: USER_REQUIREMENT.to_string(),
            sent_from: String::new(),
            send_to: HashSet::from([BROADCAST.to_string()]),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content).with_role("user")
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content).with_role("system")
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content).with_role("assistant")
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_structured(mut self, structured: Option<Value>) -> Self {
        self.structured_content = structured;
        self
    }

    /// An empty kind falls back to the user-requirement sentinel, the root
    /// of every causal chain.
    pub fn with_cause_by(mut self, cause_by: impl Into<String>) -> Self {
        let cause_by = cause_by.into();
        self.cause_by = if cause_by.is_empty() {
            USER_REQUIREMENT.to_string()
        } else {
            cause_by
        };
        self
    }

    pub fn with_sent_from(mut self, sent_from: impl Into<String>) -> Self {
        self.sent_from = sent_from.into();
        self
    }

    /// An empty recipient set is normalized to the broadcast wildcard, so
    /// `send_to` is never empty.
    pub fn with_send_to<I, S>(mut self, send_to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let recipients: HashSet<String> = send_to.into_iter().map(Into::into).collect();
        self.send_to = if recipients.is_empty() {
            HashSet::from([BROADCAST.to_string()])
        } else {
            recipients
        };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn send_to(&self) -> &HashSet<String> {
        &self.send_to
    }

    /// Whether this message addresses any of `names`, or everyone.
    pub fn is_recipient(&self, names: &HashSet<String>) -> bool {
        self.send_to.contains(BROADCAST) || names.iter().any(|n| self.send_to.contains(n))
    }
}

/// Value identity over id, content and routing. The timestamp and the
/// structured payload stay out of it, so a republished clone compares equal
/// to the stored original.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.content == other.content
            && self.role == other.role
            && self.cause_by == other.cause_by
            && self.sent_from == other.sent_from
            && self.send_to == other.send_to
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.structured_content {
            Some(structured) => write!(f, "{}: {}", self.role, structured),
            None => write!(f, "{}: {}", self.role, self.content),
        }
    }
}

#[test]
fn test_defaults() {
    let msg = Message::new("hello");
    assert!(!msg.id().is_empty());
    assert_eq!(msg.role, "user");
    assert_eq!(msg.cause_by, USER_REQUIREMENT);
    assert_eq!(msg.send_to(), &HashSet::from([BROADCAST.to_string()]));
}

#[test]
fn test_empty_routing_is_normalized() {
    let msg = Message::new("x")
        .with_cause_by("")
        .with_send_to(Vec::<String>::new());
    assert_eq!(msg.cause_by, USER_REQUIREMENT);
    assert_eq!(msg.send_to(), &HashSet::from([BROADCAST.to_string()]));
}

#[test]
fn test_equality_ignores_timestamp() {
    let msg = Message::new("same");
    let mut clone = msg.clone();
    clone.timestamp = Utc::now();
    assert_eq!(msg, clone);

    let other = Message::new("same");
    assert_ne!(msg, other); // fresh id
}

#[test]
fn test_is_recipient() {
    let broadcast = Message::new("to everyone");
    let direct = Message::new("to bob").with_send_to(["Bob"]);

    let bob = HashSet::from(["Bob".to_string()]);
    let carol = HashSet::from(["Carol".to_string()]);
    assert!(broadcast.is_recipient(&bob));
    assert!(direct.is_recipient(&bob));
    assert!(!direct.is_recipient(&carol));
}

#[test]
fn test_display_prefers_structured_payload() {
    let msg = Message::new("echo")
        .with_role("qa")
        .with_structured(Some(serde_json::json!({"verdict": "pass"})));
    assert_eq!(msg.to_string(), r#"qa: {"verdict":"pass"}"#);
}
