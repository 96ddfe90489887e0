//! MailSift - extract, filter and export email lists
//!
//! Command-line front end. It initializes:
//! - Settings ([`ConfigManager`], `settings.yaml` + `MAILSIFT_*` env)
//! - Logging (daily rotating file, optional console)
//! - A single-threaded tokio runtime (file reads are the only async work)
//! - The session ([`StateManager`] + [`SessionController`])
//!
//! # Commands
//!
//! - `mailsift clean <FILE>`: extract, filter, print a summary and write `<name>.<ext>`
//! - `mailsift bookmarks list|save|last|delete`: manage saved keyword filters
//! - `mailsift config show|init`: inspect or create `settings.yaml`

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use mailsift::config::DEFAULT_DATA_DIR;
use mailsift::metrics::Metrics;
use mailsift::models::parse_keyword_list;
use mailsift::services::BookmarkError;
use mailsift::ui::report::{
    EMPTY_RESULT_MESSAGE, render_bookmarks, render_preview, render_status, render_summary,
};
use mailsift::ui::{BookmarkSelection, SelectionSource, SessionController};
use mailsift::{APP_NAME, ConfigManager, OutputFormat, StateChange, StateManager, UserConfig, VERSION};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const DEFAULT_OUTPUT_SUBDIR: &str = "cleaned";

/// Upper bound on waiting for status lines after a run returns.
const STATUS_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "mailsift", version)]
#[command(about = "Extract, filter and export email lists from text and spreadsheet files")]
#[command(after_help = "\
EXAMPLES:
  mailsift clean contacts.xlsx                    # Clean with configured defaults
  mailsift clean list.csv --keywords \"spam,test\"  # Drop emails containing keywords
  mailsift clean dump.log --format txt -o out/    # Write out/dump.txt
  mailsift clean list.csv                         # Write cleaned/list.csv
  mailsift bookmarks save \"noreply, donotreply\"   # Save a keyword filter")]
struct Cli {
    /// Directory holding settings.yaml and storage.json
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: Utf8PathBuf,

    /// Debug logging, mirrored to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and filter emails from a .txt, .csv, .log or .xlsx file
    Clean(CleanArgs),

    /// Manage saved keyword filters
    #[command(subcommand)]
    Bookmarks(BookmarkCommand),

    /// Inspect or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct CleanArgs {
    /// Input file
    file: Utf8PathBuf,

    /// Treat the input as a dropped file (.txt, .csv or .xlsx only)
    #[arg(long)]
    dropped: bool,

    /// Remove case-insensitive duplicates
    #[arg(long, overrides_with = "keep_duplicates")]
    remove_duplicates: bool,
    #[arg(long, hide = true)]
    keep_duplicates: bool,

    /// Remove candidates that are not local@domain.tld
    #[arg(long, overrides_with = "keep_invalid")]
    remove_invalid: bool,
    #[arg(long, hide = true)]
    keep_invalid: bool,

    /// Remove addresses with a one-character local part
    #[arg(long, overrides_with = "keep_single_char")]
    remove_single_char: bool,
    #[arg(long, hide = true)]
    keep_single_char: bool,

    /// Remove addresses whose local part starts with a digit
    #[arg(long, overrides_with = "keep_numeric_start")]
    remove_numeric_start: bool,
    #[arg(long, hide = true)]
    keep_numeric_start: bool,

    /// Comma-separated keywords; matching addresses are removed
    #[arg(short, long, conflicts_with_all = ["bookmark", "last_bookmark"])]
    keywords: Option<String>,

    /// Use the saved keyword filter at this position
    #[arg(long, conflicts_with = "last_bookmark")]
    bookmark: Option<usize>,

    /// Use the most recently saved keyword filter
    #[arg(long)]
    last_bookmark: bool,

    /// Output format: csv, txt, xlsx or same
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Output directory (default: `cleaned/` next to the input file)
    #[arg(short, long, value_name = "DIR")]
    output: Option<Utf8PathBuf>,

    /// Show the first N cleaned emails (1-10000)
    #[arg(long, value_name = "N", conflicts_with = "no_preview")]
    preview: Option<usize>,

    /// Do not print a preview
    #[arg(long)]
    no_preview: bool,
}

#[derive(Subcommand)]
enum BookmarkCommand {
    /// List saved keyword filters
    List,
    /// Save a keyword filter
    Save {
        /// Comma-separated keywords
        keywords: String,
    },
    /// Show the most recently saved keyword filter
    Last,
    /// Delete the keyword filter at INDEX
    Delete { index: usize },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as YAML
    Show,
    /// Write a settings file with defaults
    Init {
        /// Replace an existing settings file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.data_dir)?;
    let mut user_config = config_manager.load_user_config()?;
    if cli.verbose {
        user_config.logging.debug = true;
        user_config.logging.console = true;
    }

    let _log_guard = mailsift::logging::setup_logging(&user_config.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // One run at a time; the file read is the only thing that awaits
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let state_manager = Arc::new(StateManager::new());
    let metrics = Arc::new(Metrics::new());
    let controller = SessionController::new(
        state_manager,
        Arc::new(config_manager.bookmark_store()),
        metrics.clone(),
    );

    let result = match cli.command {
        Commands::Clean(args) => runtime.block_on(cmd_clean(&controller, &user_config, args)),
        Commands::Bookmarks(command) => cmd_bookmarks(&controller, command),
        Commands::Config(command) => cmd_config(&config_manager, &user_config, command),
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }

    metrics.log_summary();
    tracing::info!("Shutdown complete");

    result
}

async fn cmd_clean(
    controller: &SessionController,
    user_config: &UserConfig,
    args: CleanArgs,
) -> Result<()> {
    let source = if args.dropped {
        SelectionSource::Drop
    } else {
        SelectionSource::Picker
    };
    controller.select_file(&args.file, source)?;

    let mut filter_config = user_config.filters.to_filter_configuration();
    filter_config.remove_duplicates = flag_override(
        args.remove_duplicates,
        args.keep_duplicates,
        filter_config.remove_duplicates,
    );
    filter_config.remove_invalid = flag_override(
        args.remove_invalid,
        args.keep_invalid,
        filter_config.remove_invalid,
    );
    filter_config.remove_single_char_local = flag_override(
        args.remove_single_char,
        args.keep_single_char,
        filter_config.remove_single_char_local,
    );
    filter_config.remove_numeric_start_local = flag_override(
        args.remove_numeric_start,
        args.keep_numeric_start,
        filter_config.remove_numeric_start_local,
    );

    if let Some(raw) = &args.keywords {
        filter_config.keywords = parse_keyword_list(raw);
    } else if let Some(index) = args.bookmark {
        filter_config.keywords =
            controller.bookmark_keywords_or(BookmarkSelection::Index(index), filter_config.keywords);
    } else if args.last_bookmark {
        filter_config.keywords =
            controller.bookmark_keywords_or(BookmarkSelection::MostRecent, filter_config.keywords);
    }

    if let Some(format) = args.format {
        filter_config.output_format = format;
    }

    let status_printer = tokio::spawn(print_status_lines(controller.state().subscribe()));
    let run_result = controller.run(&filter_config).await;
    let _ = tokio::time::timeout(STATUS_DRAIN_TIMEOUT, status_printer).await;
    let summary = run_result?;
    let raw_count = controller.state().read(|s| s.raw_count);
    println!("{}", render_summary(raw_count, &summary));

    let mut preview = user_config.preview.clone();
    if let Some(count) = args.preview {
        preview.enabled = true;
        preview.count = count;
    }
    if args.no_preview {
        preview.enabled = false;
    }
    if preview.enabled {
        let cleaned = controller.state().read(|s| s.cleaned.clone());
        println!();
        println!("{}", render_preview(&cleaned, preview.count));
    }

    let output_dir = match args.output {
        Some(dir) => dir,
        None => default_output_dir(&args.file),
    };

    match controller
        .export_to_dir(filter_config.output_format, &output_dir)
        .await?
    {
        Some(path) => println!("Saved cleaned list to {}", path),
        None if preview.enabled => {}
        None => println!("{}", EMPTY_RESULT_MESSAGE),
    }

    Ok(())
}

/// Echo run status changes to stderr until the run finishes or fails.
async fn print_status_lines(mut rx: broadcast::Receiver<StateChange>) {
    while let Ok(change) = rx.recv().await {
        if let Some(line) = render_status(&change) {
            eprintln!("{}", line);
        }
        if matches!(
            change,
            StateChange::RunFinished { .. } | StateChange::RunFailed { .. }
        ) {
            break;
        }
    }
}

fn cmd_bookmarks(controller: &SessionController, command: BookmarkCommand) -> Result<()> {
    // Bookmark failures are reported but never fail the command
    match command {
        BookmarkCommand::List => match controller.try_bookmarks() {
            Ok(bookmarks) => println!("{}", render_bookmarks(&bookmarks)),
            Err(e) => {
                eprintln!("Error loading keywords: {}", e);
                println!("{}", render_bookmarks(&[]));
            }
        },
        BookmarkCommand::Save { keywords } => match controller.save_bookmark(&keywords) {
            Ok(()) => println!("Keywords saved!"),
            Err(e) => report_bookmark_error(&e),
        },
        BookmarkCommand::Last => match controller.bookmark(BookmarkSelection::MostRecent) {
            Ok(keywords) => println!("{}", keywords),
            Err(e) => report_bookmark_error(&e),
        },
        BookmarkCommand::Delete { index } => match controller.delete_bookmark(index) {
            Ok(()) => println!("{}", render_bookmarks(&controller.bookmarks())),
            Err(e) => report_bookmark_error(&e),
        },
    }

    Ok(())
}

fn report_bookmark_error(e: &BookmarkError) {
    tracing::warn!("Bookmark operation failed: {}", e);
    eprintln!("{}", e);
}

fn cmd_config(
    config_manager: &ConfigManager,
    user_config: &UserConfig,
    command: ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("# Data directory: {}", config_manager.config_dir());
            print!("{}", serde_yaml_ng::to_string(user_config)?);
        }
        ConfigCommand::Init { force } => {
            if config_manager.init_user_config(force)? {
                println!("Wrote {}", config_manager.settings_path());
            } else {
                println!(
                    "{} already exists (use --force to replace it)",
                    config_manager.settings_path()
                );
            }
        }
    }

    Ok(())
}

/// `on` wins over `off`; neither keeps the configured default.
fn flag_override(on: bool, off: bool, default: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (false, true) => false,
        (false, false) => default,
    }
}

fn default_output_dir(input: &Utf8Path) -> Utf8PathBuf {
    let parent = match input.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    parent.join(DEFAULT_OUTPUT_SUBDIR)
}
