//! Command-line entry point for distributed answer searches
//!
//! Launch one coordinator and one worker per scoring slot:
//!
//! ```bash
//! answer-mcts coordinator --listen 127.0.0.1:7717 --workers 3
//! answer-mcts worker --index 1 --connect 127.0.0.1:7717
//! answer-mcts worker --index 2 --connect 127.0.0.1:7717
//! answer-mcts worker --index 3 --connect 127.0.0.1:7717
//! ```
//!
//! Both roles read the generation-service credentials from
//! `ANSWER_MCTS_API_BASE` and `ANSWER_MCTS_API_KEY`.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use answer_mcts::transport::tcp::{TcpCoordinator, TcpWorker};
use answer_mcts::{run_worker, AnswerSearch, OpenAiGateway, Role, SearchConfig, SearchError};

#[derive(Parser, Debug)]
#[command(name = "answer-mcts")]
#[command(about = "Distributed MCTS search for the best answer to a question")]
struct Cli {
    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand, Debug)]
enum RoleCommand {
    /// Own the search tree and drive iterations
    Coordinator {
        /// Address to listen on for worker connections
        #[arg(long, default_value = "127.0.0.1:7717")]
        listen: String,

        /// Number of workers that must connect before the search starts
        #[arg(long, default_value_t = 3)]
        workers: usize,

        /// Number of MCTS iterations to run
        #[arg(long, default_value_t = 3)]
        iterations: usize,

        /// Model name passed to the generation service
        #[arg(long, default_value = "llama-3.2-1b-preview")]
        model: String,
    },

    /// Score one answer per round on the coordinator's request
    Worker {
        /// This worker's index, 1-based and unique across the pool
        #[arg(long)]
        index: usize,

        /// Coordinator address to connect to
        #[arg(long, default_value = "127.0.0.1:7717")]
        connect: String,

        /// Model name passed to the generation service
        #[arg(long, default_value = "llama-3.2-1b-preview")]
        model: String,
    },
}

fn read_question() -> io::Result<String> {
    print!("Enter your question: ");
    io::stdout().flush()?;

    let mut question = String::new();
    io::stdin().lock().read_line(&mut question)?;
    Ok(question.trim().to_string())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.role {
        RoleCommand::Coordinator {
            listen,
            workers,
            iterations,
            model,
        } => {
            info!("process started as {:?}", Role::Coordinator);

            // An unreachable backend is fatal before any iteration runs.
            let gateway = OpenAiGateway::from_env(model.as_str()).map_err(SearchError::from)?;

            let mut transport =
                TcpCoordinator::bind(&listen, workers).map_err(SearchError::from)?;

            let question = read_question()?;
            info!("question received: {question}");

            let config = SearchConfig::default()
                .with_iterations(iterations)
                .with_model(model);
            let mut search = AnswerSearch::new(config, gateway);

            let report = search.run_coordinator(&question, &mut transport)?;

            println!("\n{report}");
            info!("{}", search.statistics().summary());
            Ok(())
        }

        RoleCommand::Worker {
            index,
            connect,
            model,
        } => {
            info!("process started as {:?}", Role::Worker(index));

            let gateway = OpenAiGateway::from_env(model).map_err(SearchError::from)?;
            let mut transport =
                TcpWorker::connect(&connect, index).map_err(SearchError::from)?;

            run_worker(&gateway, &mut transport)?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("answer-mcts: {e}");
            ExitCode::FAILURE
        }
    }
}
