// main.rs

// Module declarations
mod action;
mod config;
mod environment;
mod llm;
mod memory;
mod message;
mod profiles;
mod prompt;
mod review;
mod role;
mod state;

use crate::config::Config;
use crate::environment::Environment;
use crate::llm::Llm;
use crate::message::Message;
use crate::review::{ReviewGate, ReviewTrigger, StdinChannel};
use cli_log::info;
use color_eyre::eyre::Result;
use colored::Colorize;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    cli_log::init_cli_log!();

    let config = Config::load_or_default(Path::new("config.json"));
    let args: Vec<String> = std::env::args().skip(1).collect();
    let goal = if args.is_empty() {
        read_goal()?
    } else {
        args.join(" ")
    };

    let llm = Llm::new(config.model.clone());
    info!("using model {}", llm.model());

    let mut environment = Environment::new();
    environment.add_roles(
        config
            .roles
            .iter()
            .map(|role| profiles::build_role(role, &llm)),
    );
    if config.debug {
        for (profile, role) in environment.get_roles() {
            println!("{} {} hired as {}", "[team]".dimmed(), role.name(), profile);
        }
    }

    environment.publish_message(Message::user(goal));

    let mut gate = ReviewGate::new(Box::new(StdinChannel));
    for round in 1..=config.rounds {
        println!(
            "{}",
            format!("=== Round {}/{} ===", round, config.rounds)
                .bright_yellow()
                .bold()
        );
        environment.run(1).await?;

        if config.review && round < config.rounds {
            let history = environment.history();
            let recent = history.len().saturating_sub(5);
            let review = gate.ask(&history[recent..], None, ReviewTrigger::Task)?;
            if !review.confirmed && !review.response.trim().is_empty() {
                // a change request re-enters the loop as a fresh requirement
                environment.publish_message(Message::user(review.response));
            }
        }
    }

    println!("{}", "Session complete.".bright_green().bold());
    Ok(())
}

fn read_goal() -> Result<String> {
    use std::io::{self, Write};
    print!("{} ", "Goal:".bright_green().bold());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
