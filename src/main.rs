//! Command-line interface for tool-relay.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tool_relay::cache::{ensure_assistant, EntityCache};
use tool_relay::config::{self, ToolRelayConfig};
use tool_relay::conversation::{AssistantsClient, RunEvent, RunRequest};
use tool_relay::facade::ToolRelay;
use tool_relay::logging;
use tool_relay::run::RunObserver;
use tool_relay::schema::SchemaFormat;
use tool_relay::tools::ToolCallResult;

/// Expose typed tools to LLM conversations and resolve their tool calls
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to the search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tool modules to register, separated by ';' or ','
    #[arg(long, global = true, env = "TOOL_RELAY_MODULES")]
    modules: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered tools
    List,
    /// Show a tool's function definition
    Show {
        /// Tool name
        name: String,
    },
    /// Print a tool's schema in one wire format
    Schema {
        /// Tool name
        name: String,
        /// Wire format: function, chat, assistants or messages
        #[arg(short, long, default_value = "function")]
        format: SchemaFormat,
    },
    /// Invoke a tool with raw argument text
    Invoke {
        /// Tool name
        name: String,
        /// Arguments as (possibly malformed) JSON
        #[arg(short, long, default_value = "")]
        args: String,
    },
    /// Run an assistant on a thread, resolving its tool calls
    Run {
        /// Thread to run on; a new thread is created when omitted
        #[arg(short, long)]
        thread: Option<String>,
        /// Assistant identifier or name
        #[arg(short, long)]
        assistant: String,
        /// User message appended to the thread before the run
        #[arg(short, long)]
        message: Option<String>,
        /// Bypass the assistant cache
        #[arg(long)]
        refresh: bool,
    },
}

/// Streams assistant text to stdout and tool activity to stderr.
#[derive(Debug, Default)]
struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_event(&mut self, event: &RunEvent) {
        match event {
            RunEvent::MessageDelta { text, .. } => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
            RunEvent::MessageCompleted { .. } => println!(),
            _ => {}
        }
    }

    fn on_tool_results(&mut self, run_id: &str, results: &[ToolCallResult]) {
        for result in results {
            eprintln!("[{}] {} -> {}", run_id, result.call_id, result.content);
        }
    }
}

fn load_config(cli: &Cli) -> Result<ToolRelayConfig> {
    let config = match &cli.config {
        Some(path) => config::from_path(path)?,
        None => config::load()?,
    };
    Ok(match &cli.modules {
        Some(modules) => config.apply_modules_override(modules),
        None => config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    config.logging.level = config.logging.level.raised_by(cli.verbose);
    logging::init(&config.logging).context("failed to initialize logging")?;

    let relay = ToolRelay::from_config(&config)?;

    match cli.command {
        Command::List => {
            for tool in relay.list_tools() {
                println!("{:<24} {}", tool.name, tool.description);
            }
        }
        Command::Show { name } => {
            let definition = relay.get_tool(&name)?;
            println!("{}", serde_json::to_string_pretty(definition)?);
        }
        Command::Schema { name, format } => {
            let tool = relay.registry().require(&name)?;
            println!("{}", serde_json::to_string_pretty(&tool.schema_as(format))?);
        }
        Command::Invoke { name, args } => {
            println!("{}", relay.invoke(&name, &args).await?);
        }
        Command::Run {
            thread,
            assistant,
            message,
            refresh,
        } => {
            let client = Arc::new(AssistantsClient::from_config(&config.service)?);
            let cache = EntityCache::new(config.cache.build_backend()?);
            let assistant = ensure_assistant(
                client.as_ref(),
                &assistant,
                Some(&cache),
                config.cache.ttl(),
                refresh,
            )
            .await?;

            let thread_id = match thread {
                Some(id) => id,
                None => client.create_thread().await?,
            };
            if let Some(text) = message {
                client.create_message(&thread_id, &text).await?;
            }

            let request = RunRequest::new(assistant.id.clone()).with_tools(
                relay
                    .registry()
                    .definitions()
                    .map(|tool| tool.schema_as(SchemaFormat::Assistants))
                    .collect(),
            );
            let resolver = relay.resolver(client, config.run.to_run_config());
            let report = resolver
                .start(&thread_id, &request, &mut ConsoleObserver)
                .await?;
            eprintln!(
                "run {} on thread {} completed after {} submission(s)",
                report.run_id(),
                thread_id,
                report.submissions
            );
        }
    }

    Ok(())
}
