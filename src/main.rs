//! Thriftroute command-line entry point
//!
//! Routes prompts against the builtin catalog and prints the decision, and
//! provides catalog inspection and config template generation.

use clap::Parser;
use std::io::Read;
use std::str::FromStr;
use thriftroute::cli::{generate_config_template, render_decision, Cli, Command};
use thriftroute::config::Config;
use thriftroute::message::Message;
use thriftroute::registry::{Capability, Mode};
use thriftroute::router::{RouteOptions, Router};
use thriftroute::telemetry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        // Template generation must work without a readable config file
        Command::Config { output } => write_template(output.as_deref()),
        Command::Models { capability } => {
            let (_, router) = load(&cli.config)?;
            let capability = match capability {
                Some(raw) => Some(Capability::from_str(&raw)?),
                None => None,
            };
            print_models(&router, capability);
            Ok(())
        }
        Command::Route {
            prompt,
            mode,
            force,
            parent,
            system,
            dry,
        } => {
            let (config, router) = load(&cli.config)?;

            let prompt = gather_prompt(prompt)?;
            let mode = match mode {
                Some(raw) => Mode::from_str(&raw)?,
                None => config.default_mode(),
            };

            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(prompt));

            let mut options = RouteOptions::for_mode(mode);
            options.force_model = force;
            options.parent_request_id = parent;

            let decision = if dry {
                router.preview(&messages, &options)
            } else {
                router.route(&messages, &options)
            };

            println!("{}", render_decision(&decision)?);
            Ok(())
        }
    }
}

fn load(config_path: &str) -> Result<(Config, Router), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(config.log_level());
    let router = Router::from_config(&config)?;
    Ok((config, router))
}

fn write_template(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)?;
            println!("Wrote configuration template to {path}");
        }
        None => print!("{template}"),
    }
    Ok(())
}

fn gather_prompt(words: Vec<String>) -> Result<String, Box<dyn std::error::Error>> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    let prompt = buffer.trim().to_string();
    if prompt.is_empty() {
        return Err("no prompt provided: pass it as arguments or pipe it via stdin".into());
    }
    Ok(prompt)
}

fn print_models(router: &Router, capability: Option<Capability>) {
    let availability = router.availability();
    println!(
        "{:<24} {:<10} {:>10} {:>11}  {}",
        "MODEL", "PROVIDER", "IN $/MTOK", "OUT $/MTOK", "CONFIGURED"
    );
    for model in router.catalog().models() {
        if let Some(required) = capability {
            if !model.has_capability(required) {
                continue;
            }
        }
        let configured = if availability.is_configured(model.provider()) {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<24} {:<10} {:>10.2} {:>11.2}  {}",
            model.id(),
            model.provider().as_str(),
            model.input_cost_per_mtok(),
            model.output_cost_per_mtok(),
            configured
        );
    }
}
