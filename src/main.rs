// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use srtlingo::app_config::{Config, LogLevel};
use srtlingo::app_controller::{Controller, FileOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a subtitle file or every subtitle file in a directory
    Translate(TranslateArgs),

    /// Strip markup from a subtitle file, storing it in a format map side-car
    Optimize {
        /// Subtitle file to strip
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Reapply markup from a format map to a translated subtitle file
    Restore {
        /// Translated subtitle file
        #[arg(value_name = "TRANSLATED")]
        translated: PathBuf,

        /// Format map written by `optimize`
        #[arg(value_name = "FORMAT_MAP")]
        format_map: PathBuf,

        /// Output file (defaults to `<stem>.restored.srt`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for srtlingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input subtitle file or directory to process
    #[arg(value_name = "INPUT")]
    input_path: PathBuf,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Prompt style (standard, natural, formal)
    #[arg(long)]
    style: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// srtlingo - markup-preserving subtitle translation
#[derive(Parser, Debug)]
#[command(name = "srtlingo")]
#[command(version)]
#[command(about = "Translate SubRip subtitles with a language model, keeping their markup")]
#[command(long_about = "srtlingo translates SubRip subtitles through a local Ollama model.
Markup such as <i>, <font color=...> or {\\an8} is removed before translation
and reapplied to the translated text.

EXAMPLES:
    srtlingo translate movie.en.srt                # Translate using default config
    srtlingo translate -t es -f movie.en.srt       # Force Spanish output
    srtlingo translate --style formal /subtitles/  # Process a whole directory
    srtlingo optimize movie.srt                    # Write movie.clean.srt + movie.format.json
    srtlingo restore movie.clean.fr.srt movie.format.json
    srtlingo completions bash > srtlingo.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtlingo", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Optimize { input, force_overwrite } => {
            let (clean, map) = Controller::optimize_file(&input, force_overwrite)?;
            info!("Success: {} + {}", clean.display(), map.display());
            Ok(())
        }
        Commands::Restore { translated, format_map, output } => {
            Controller::restore_file(&translated, &format_map, output)?;
            Ok(())
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(model) = &options.model {
        config.translation.provider.model = model.clone();
    }
    if let Some(style) = &options.style {
        config.translation.common.style = style.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.into());
    }

    let controller = Controller::with_config(config)?;
    controller.test_connection().await?;
    let _ctrl_c = controller.listen_for_ctrl_c();

    if options.input_path.is_file() {
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf());

        if let FileOutcome::Cancelled(report) = controller.run(options.input_path.clone(), output_dir, options.force_overwrite).await? {
            return Err(anyhow!("Translation cancelled: {}", report));
        }
    } else if options.input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored for directories, translations are written next to their source");
        }
        let outcomes = controller.run_folder(options.input_path.clone(), options.force_overwrite).await?;
        if outcomes.iter().any(|o| matches!(o, FileOutcome::Cancelled(_))) {
            return Err(anyhow!("Translation cancelled"));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
