use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use md2jira::{
	ParseContext, ParseOptions,
	cache::TsvStore,
	config::Settings,
	jira::create_client,
	logging, parse_document,
	reconcile::Reconciler,
	render_markdown,
};

#[derive(Debug, Parser)]
#[command(name = "md2jira", author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about)]
struct Cli {
	/// Markdown document: `#` epics, `##` stories, `###` subtasks
	#[arg(short, long)]
	input: PathBuf,
	/// Jira project key, overrides JIRA_PROJECT_KEY
	#[arg(short, long)]
	project: Option<String>,
	/// Print diff and cache decisions for every issue
	#[arg(short, long)]
	verbose: bool,
	/// Cache file, overrides JIRA_CACHE_PATH
	#[arg(long)]
	cache: Option<PathBuf>,
	/// Parse and print the hierarchy without contacting Jira
	#[arg(long)]
	dry_run: bool,
}

fn main() -> Result<()> {
	color_eyre::install()?;
	let cli = Cli::parse();
	logging::init(cli.verbose)?;

	let mut settings = Settings::load(Path::new("."))?;
	if let Some(project) = cli.project {
		settings.project_key = Some(project);
	}
	if let Some(cache) = cli.cache {
		settings.cache_path = cache;
	}
	let fields = settings.field_ids();

	let content = std::fs::read_to_string(&cli.input).wrap_err_with(|| format!("Failed to read {}", cli.input.display()))?;
	let ctx = ParseContext::new(content, cli.input.display().to_string());
	let options = ParseOptions {
		checklists: fields.checklist.is_some(),
	};
	let issues = match parse_document(&ctx, options) {
		Ok(issues) => issues,
		Err(e) => {
			eprintln!("{:?}", miette::Report::new(e));
			bail!("Failed to parse {}", cli.input.display());
		}
	};
	tracing::debug!("Parsed {} issues from {}", issues.len(), cli.input.display());

	if cli.dry_run {
		print!("{}", render_markdown(&issues));
		return Ok(());
	}

	let jira = settings.jira()?;
	let project_key = jira.project_key.clone();
	let client = create_client(jira, fields.clone());
	let mut store = TsvStore::new(&settings.cache_path);

	let report = Reconciler::new(client.as_ref(), &mut store, project_key, fields).reconcile_all(issues)?;

	for entry in &report.issues {
		if cli.verbose {
			for note in &entry.notes {
				println!("{note}");
			}
		}
		println!("{entry}");
	}
	println!("{report}");
	Ok(())
}
