use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lore_service::{AskRequest, LoreService};

#[derive(Debug, Parser)]
#[command(
	version = lore_cli::VERSION,
	rename_all = "kebab",
	styles = lore_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Answer a question from the indexed corpus.
	Ask(QueryArgs),
	/// Show the retrieved scenes, context blocks and prompt without generating.
	Preview(QueryArgs),
}

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
	pub question: String,
	/// Candidates requested from the vector index.
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
	/// Corpus to search, e.g. `斗破苍穹` or `斗破苍穹.txt`.
	#[arg(long, value_name = "NAME")]
	pub novel: Option<String>,
	#[arg(long, value_name = "VERSION")]
	pub corpus_version: Option<String>,
}

impl QueryArgs {
	pub fn into_request(self) -> AskRequest {
		AskRequest {
			question: self.question,
			top_k: self.top_k,
			novel: self.novel,
			version: self.corpus_version,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = lore_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = LoreService::from_config(config)?;
	let output = match args.command {
		Command::Ask(query) => {
			let answer = service.ask(query.into_request()).await?;

			serde_json::to_string_pretty(&answer)?
		},
		Command::Preview(query) => {
			let preview = service.preview(query.into_request()).await?;

			serde_json::to_string_pretty(&preview)?
		},
	};

	println!("{output}");

	Ok(())
}

fn init_tracing(config: &lore_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
