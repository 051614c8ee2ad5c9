use clap::Parser;

use lore_ask::{Args, Command};

#[test]
fn parses_ask_with_filters() {
	let args = Args::try_parse_from([
		"lore-ask",
		"-c",
		"lore.toml",
		"ask",
		"萧炎在哪里？",
		"--top-k",
		"8",
		"--novel",
		"斗破苍穹.txt",
		"--corpus-version",
		"v2",
	])
	.expect("Failed to parse args.");
	let Command::Ask(query) = args.command else {
		panic!("Expected the ask command.");
	};
	let req = query.into_request();

	assert_eq!(args.config.to_string_lossy(), "lore.toml");
	assert_eq!(req.question, "萧炎在哪里？");
	assert_eq!(req.top_k, Some(8));
	assert_eq!(req.novel.as_deref(), Some("斗破苍穹.txt"));
	assert_eq!(req.version.as_deref(), Some("v2"));
}

#[test]
fn preview_defaults_leave_filters_unset() {
	let args = Args::try_parse_from(["lore-ask", "--config", "lore.toml", "preview", "q"])
		.expect("Failed to parse args.");
	let Command::Preview(query) = args.command else {
		panic!("Expected the preview command.");
	};
	let req = query.into_request();

	assert_eq!(req.top_k, None);
	assert_eq!(req.novel, None);
	assert_eq!(req.version, None);
}

#[test]
fn config_flag_is_required() {
	assert!(Args::try_parse_from(["lore-ask", "ask", "q"]).is_err());
}
