// review.rs
use crate::message::Message;
use cli_log::info;
use color_eyre::eyre::Result;
use colored::Colorize;
use lazy_static::lazy_static;
use std::fmt;
use std::io::{self, Write};

pub const CONTINUE_WORDS: [&str; 5] = ["confirm", "continue", "c", "yes", "y"];
pub const CHANGE_WORD: &str = "change";
pub const EXIT_WORD: &str = "exit";

lazy_static! {
    pub static ref TASK_REVIEW_INSTRUCTION: String = format!(
        "If you want to change, add, delete a task or merge tasks in the plan, \
         say '{} task task_id or current task, ... (things to change)'. If you \
         confirm the output from the current task and wish to continue, type: {}",
        CHANGE_WORD, CONTINUE_WORDS[0]
    );
    pub static ref CODE_REVIEW_INSTRUCTION: String = format!(
        "If you want the code to be rewritten, say '{} ... (your change advice)'. \
         If you want to leave it as is, type: {} or {}",
        CHANGE_WORD, CONTINUE_WORDS[0], CONTINUE_WORDS[1]
    );
    pub static ref EXIT_INSTRUCTION: String =
        format!("If you want to terminate the process, type: {}", EXIT_WORD);
}

/// Which checkpoint this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTrigger {
    Task,
    Code,
}

impl fmt::Display for ReviewTrigger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReviewTrigger::Task => write!(f, "task"),
            ReviewTrigger::Code => write!(f, "code"),
        }
    }
}

/// Ordered task list shown to the operator at the checkpoint.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub goal: String,
    pub tasks: Vec<PlanTask>,
}

#[derive(Debug, Clone)]
pub struct PlanTask {
    pub task_id: String,
    pub instruction: String,
    pub finished: bool,
}

/// Outcome of one checkpoint: whether the operator confirmed, plus the raw
/// reply. The reply is returned verbatim even when confirmed, so a combined
/// answer ("confirm, but change task 2 to ...") keeps its embedded edit
/// instructions for a downstream interpreter.
#[derive(Debug, Clone)]
pub struct Review {
    pub confirmed: bool,
    pub response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Exit,
    Confirmed,
    Rejected,
}

/// Classifies an operator reply. Exit wins over everything; confirmation is
/// an exact continue token or the primary token appearing anywhere as a
/// substring (kept literally for compatibility, misclassifications and
/// all); the rest is a change request. There is no retry; an empty or malformed
/// reply is simply "not confirmed".
pub fn classify(response: &str) -> Verdict {
    let lowered = response.trim().to_lowercase();
    if lowered.contains(EXIT_WORD) {
        return Verdict::Exit;
    }
    if CONTINUE_WORDS.contains(&lowered.as_str()) || lowered.contains(CONTINUE_WORDS[0]) {
        return Verdict::Confirmed;
    }
    Verdict::Rejected
}

/// Blocking line-based surface the gate reads the operator through; a
/// collaborator so tests can script it.
pub trait ReviewChannel {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

pub struct StdinChannel;

impl ReviewChannel for StdinChannel {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Synchronous human checkpoint between plan steps. One state transition
/// per invocation: awaiting input → terminate, confirmed, or rejected.
pub struct ReviewGate {
    channel: Box<dyn ReviewChannel>,
}

impl ReviewGate {
    pub fn new(channel: Box<dyn ReviewChannel>) -> Self {
        Self { channel }
    }

    pub fn ask(
        &mut self,
        context: &[Message],
        plan: Option<&Plan>,
        trigger: ReviewTrigger,
    ) -> Result<Review> {
        if let Some(plan) = plan {
            println!("{} {}", "Current overall plan:".bright_yellow().bold(), plan.goal);
            for task in &plan.tasks {
                println!(
                    "  {}: {}, finished: {}",
                    task.task_id, task.instruction, task.finished
                );
            }
        }

        let latest_action = context
            .last()
            .map(|m| m.cause_by.as_str())
            .unwrap_or("")
            .to_string();
        let instruction = match trigger {
            ReviewTrigger::Task => TASK_REVIEW_INSTRUCTION.as_str(),
            ReviewTrigger::Code => CODE_REVIEW_INSTRUCTION.as_str(),
        };
        let prompt = format!(
            "This is a <{}> review. Please review the output from {}.\n{}\n{}\n{}",
            trigger,
            latest_action,
            instruction,
            EXIT_INSTRUCTION.as_str(),
            "Please type your review below:\n".bright_yellow()
        );

        let response = self.channel.read_line(&prompt)?;
        match classify(&response) {
            Verdict::Exit => {
                info!("operator requested exit at the {} checkpoint", trigger);
                println!("{}", "Terminating on operator request.".bright_red().bold());
                std::process::exit(0);
            }
            Verdict::Confirmed => Ok(Review {
                confirmed: true,
                response,
            }),
            Verdict::Rejected => Ok(Review {
                confirmed: false,
                response,
            }),
        }
    }
}
