use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = lore_ask::Args::parse();

	lore_ask::run(args).await
}
