//! RepoChat CLI entry point.
//!
//! Loads a GitHub repository into memory and prints the prompts the agents
//! would send, or formats a model reply read from stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Read};

use repochat::application::format::format_response;
use repochat::application::selection::{parse_path_list, relevance_prompt, selected_content};
use repochat::application::session::{LoadedRepo, Session};
use repochat::domain::AgentKind;
use repochat::infra::app_config::load_config;
use repochat::infra::vcs::{GitCliRetriever, is_valid_repo_url};

#[derive(Parser, Debug)]
#[command(name = "repochat")]
#[command(version)]
#[command(about = "Chat with a GitHub repository through prompt agents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the files of a repository
    Files {
        /// https://github.com/<owner>/<repo>[/tree/<branch>]
        url: String,
    },

    /// Print the prompt an agent would send for a message
    Prompt {
        /// https://github.com/<owner>/<repo>[/tree/<branch>]
        url: String,

        /// Agent to use (qa, lld, codegen, changes)
        #[arg(short, long, default_value = "qa")]
        agent: AgentKind,

        /// Question, feature or task (ignored by the changes agent)
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Print the relevance-selection prompt, or the selected content for a model reply on stdin
    Select {
        /// https://github.com/<owner>/<repo>[/tree/<branch>]
        url: String,

        /// Question the files should answer
        question: String,

        /// Read the model's list of paths from stdin and print their content
        #[arg(long)]
        reply: bool,
    },

    /// Format a raw model reply read from stdin
    Format {
        /// Agent that produced the reply (qa, lld, codegen, changes)
        #[arg(short, long, default_value = "qa")]
        agent: AgentKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config();
    let retriever = GitCliRetriever;

    match args.command {
        Commands::Files { url } => {
            let mut session = Session::new(config);
            let repo = load(&mut session, &url, &retriever).await?;
            println!("{}", repo.snapshot.file_list());
        }
        Commands::Prompt {
            url,
            agent,
            message,
        } => {
            let mut session = Session::new(config);
            session.set_agent(agent);
            load(&mut session, &url, &retriever).await?;

            let reference = if agent.needs_reference() {
                Some(
                    session
                        .fetch_reference(&retriever)
                        .await
                        .context("Failed to load the default branch")?,
                )
            } else {
                None
            };

            let turn = session
                .prepare_turn(&message.join(" "), reference.as_ref())
                .context("Failed to assemble prompt")?;
            println!("{}", turn.prompt);
        }
        Commands::Select {
            url,
            question,
            reply,
        } => {
            let mut session = Session::new(config);
            let repo = load(&mut session, &url, &retriever).await?;
            if reply {
                let paths = parse_path_list(&read_stdin()?);
                log::info!("Model selected {} files", paths.len());
                println!("{}", selected_content(&repo.snapshot, &paths));
            } else {
                println!("{}", relevance_prompt(&repo.snapshot, &question)?);
            }
        }
        Commands::Format { agent } => {
            let raw = read_stdin()?;
            println!("{}", format_response(&raw, agent));
        }
    }

    Ok(())
}

async fn load<'s>(
    session: &'s mut Session,
    url: &str,
    retriever: &GitCliRetriever,
) -> Result<&'s LoadedRepo> {
    if !is_valid_repo_url(url) {
        anyhow::bail!("Invalid GitHub URL format: {url}");
    }
    session
        .load_repository(url, retriever)
        .await
        .with_context(|| format!("Error processing repository {url}"))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    if std::io::stdin().is_terminal() {
        log::warn!("Reading reply from terminal; finish with EOF (Ctrl-D)");
    }
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}
