use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelsmith::GenError;
use reelsmith::cli::commands::{analyze, config, extract, image, schema, video};
use reelsmith::cli::ui::Output;
use reelsmith::cli::{OutputFormat, load_studio};

#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(
    version,
    about = "Generate images and videos across AI providers, and extract structured model output"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, env = "REELSMITH_CONFIG", help = "Config file (skips global/project lookup)")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image, falling back across providers
    Image {
        #[arg(help = "Text prompt")]
        prompt: String,
        #[arg(long, short, default_value = "1:1", help = "Aspect ratio (1:1, 16:9, 9:16, 4:3, 3:4, 3:2, 2:3, 21:9)")]
        aspect: String,
        #[arg(long, short, help = "Preferred provider (openai, stability, fal, or a label like 'flux')")]
        provider: Option<String>,
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },

    /// Submit and poll video generation jobs
    Video {
        #[command(subcommand)]
        action: VideoAction,
    },

    /// Extract JSON from raw model output (file or stdin)
    Extract {
        #[arg(help = "Input file (stdin when omitted)")]
        input: Option<PathBuf>,
        #[arg(short = 'f', long, default_value = "json", value_parser = OutputFormat::parse, help = "Output format: json, yaml")]
        format: OutputFormat,
    },

    /// List analysis kinds or print one kind's JSON Schema
    Schema {
        #[arg(help = "Analysis kind")]
        kind: Option<String>,
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },

    /// Run a structured analysis of text content
    Analyze {
        #[arg(help = "Analysis kind (see `reelsmith schema`)")]
        kind: String,
        #[arg(help = "Input file (stdin when omitted)")]
        input: Option<PathBuf>,
        #[arg(short = 'f', long, default_value = "json", value_parser = OutputFormat::parse, help = "Output format: json, yaml")]
        format: OutputFormat,
    },

    /// Extract key takeaways from text content
    Takeaways {
        #[arg(help = "Input file (stdin when omitted)")]
        input: Option<PathBuf>,
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum VideoAction {
    /// Submit a video job
    Submit {
        #[arg(help = "Text prompt")]
        prompt: String,
        #[arg(long, short, default_value = "16:9", help = "Aspect ratio")]
        aspect: String,
        #[arg(long, short, help = "Model (kling, minimax, luma, hunyuan); defaults to config")]
        model: Option<String>,
        #[arg(long, short, help = "Poll until the job finishes")]
        wait: bool,
        #[arg(long, default_value = "5", help = "Seconds between polls with --wait")]
        interval: u64,
        #[arg(long, help = "Stop waiting after this many seconds")]
        timeout: Option<u64>,
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },
    /// Poll a previously submitted job
    Poll {
        #[arg(help = "Provider id returned by submit")]
        provider: String,
        #[arg(help = "Job id returned by submit")]
        job_id: String,
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },
    /// List video models
    Models {
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text, json, yaml")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, default_value = "text", value_parser = OutputFormat::parse, help = "Output format: text (toml), json, yaml")]
        format: OutputFormat,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
    /// Show which image providers have credentials
    Providers,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mReelsmith encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<GenError>() {
                Some(err) => Output::new().failure(err),
                None => eprintln!("\x1b[31mError:\x1b[0m {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Image {
            prompt,
            aspect,
            provider,
            format,
        } => {
            let studio = load_studio(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(image::run(&studio, &prompt, &aspect, provider.as_deref(), format))?;
        }
        Commands::Video { action } => {
            let rt = Runtime::new()?;
            match action {
                VideoAction::Submit {
                    prompt,
                    aspect,
                    model,
                    wait,
                    interval,
                    timeout,
                    format,
                } => {
                    let studio = load_studio(config_path)?;
                    rt.block_on(video::submit(
                        &studio,
                        video::SubmitOptions {
                            prompt,
                            aspect_ratio: aspect,
                            model,
                            wait,
                            interval_secs: interval,
                            timeout_secs: timeout,
                            format,
                        },
                    ))?;
                }
                VideoAction::Poll {
                    provider,
                    job_id,
                    format,
                } => {
                    let studio = load_studio(config_path)?;
                    rt.block_on(video::poll(&studio, &provider, &job_id, format))?;
                }
                VideoAction::Models { format } => {
                    video::list_models(format)?;
                }
            }
        }
        Commands::Extract { input, format } => {
            extract::run(input.as_deref(), format)?;
        }
        Commands::Schema { kind, format } => {
            schema::run(kind.as_deref(), format)?;
        }
        Commands::Analyze {
            kind,
            input,
            format,
        } => {
            let studio = load_studio(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(analyze::run(&studio, &kind, input.as_deref(), format))?;
        }
        Commands::Takeaways { input, format } => {
            let studio = load_studio(config_path)?;
            let rt = Runtime::new()?;
            rt.block_on(analyze::takeaways(&studio, input.as_deref(), format))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => config::show(config_path, format)?,
            ConfigAction::Path => config::path()?,
            ConfigAction::Init { global, force } => config::init(global, force)?,
            ConfigAction::Providers => config::providers(config_path)?,
        },
    }

    Ok(())
}
