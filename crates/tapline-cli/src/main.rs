//! Command-line driver for tapline touch gestures.
//!
//! Attaches to a session that already exists on a WebDriver/Appium endpoint
//! and performs one interaction per invocation.
//!
//! # Usage
//!
//! ```bash
//! # Tap an element by accessibility id
//! tapline -s 3f1a9c tap login-button
//!
//! # Tap by another locator strategy
//! tapline -s 3f1a9c tap '//XCUIElementTypeButton[@name="Sign In"]' -u xpath
//!
//! # Scroll down until an element shows up, at most 5 times
//! tapline -s 3f1a9c scroll-until down footer --max-attempts 5
//!
//! # Scroll inside a list until an element is gone
//! tapline -s 3f1a9c scroll-until up header --until gone --within products-list
//!
//! # Wait for a spinner to go away
//! tapline -s 3f1a9c wait invisible spinner -o 15000
//!
//! # Record every interaction as JSON Lines
//! tapline -s 3f1a9c --record run.jsonl swipe left
//! ```
//!
//! The endpoint and session default to `~/.tapline/config.json` and can be
//! set with `TAPLINE_WEBDRIVER_URL` / `TAPLINE_SESSION_ID`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use tapline_core::actor::Actor;
use tapline_core::config::TaplineConfig;
use tapline_core::drag::Drag;
use tapline_core::error::InteractionError;
use tapline_core::geometry::{Direction, PinchKind};
use tapline_core::interaction::Interaction;
use tapline_core::pinch::Pinch;
use tapline_core::record::append_json_lines;
use tapline_core::scroll_until::{ScrollUntil, StopCondition};
use tapline_core::session::{AutomationSession, DetachedSession, SessionError};
use tapline_core::swipe::{Scroll, Swipe};
use tapline_core::target::{Locator, Strategy, Target};
use tapline_core::touch::{DoubleTap, LongPress, Tap};
use tapline_core::wait::{Wait, WaitCondition};
use tapline_core::webdriver::WebDriverSession;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Drive touch gestures against an existing WebDriver/Appium session.
#[derive(Parser)]
#[command(name = "tapline")]
#[command(about = "Perform touch gestures and waits against a WebDriver session")]
#[command(version)]
struct Cli {
    /// Base URL of the WebDriver endpoint
    #[arg(short = 'w', long, env = "TAPLINE_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Id of the session to attach to
    #[arg(short, long, env = "TAPLINE_SESSION_ID")]
    session_id: Option<String>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Append interaction records to this JSON Lines file
    #[arg(long)]
    record: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct TargetArgs {
    /// Locator value (accessibility id unless --using says otherwise)
    selector: String,
    /// Locator strategy, e.g. id, xpath, accessibility-id, ios-predicate
    #[arg(short = 'u', long = "using", default_value = "accessibility-id")]
    strategy: Strategy,
    /// Name to report the target under (defaults to the selector)
    #[arg(short, long)]
    name: Option<String>,
}

impl TargetArgs {
    fn target(&self) -> Target {
        let name = self.name.as_deref().unwrap_or(&self.selector);
        Target::the(name).located_by(Locator::new(self.strategy, self.selector.as_str()))
    }
}

#[derive(Args)]
struct StrokeArgs {
    /// Direction: up, down, left, right
    direction: Direction,
    /// Fraction of the area to travel, in (0, 1]
    #[arg(long)]
    fraction: Option<f64>,
    /// Gesture duration in milliseconds
    #[arg(short, long)]
    duration: Option<u64>,
    /// Accessibility id of a container to confine the gesture to
    #[arg(long)]
    within: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PinchArg {
    In,
    Out,
}

#[derive(Clone, Copy, ValueEnum)]
enum UntilArg {
    Visible,
    Clickable,
    Gone,
}

#[derive(Clone, Copy, ValueEnum)]
enum WaitArg {
    Visible,
    Clickable,
    Present,
    Invisible,
    Selected,
    Text,
}

#[derive(Subcommand)]
enum Command {
    /// Tap the center of an element
    Tap {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Double-tap the center of an element
    DoubleTap {
        #[command(flatten)]
        target: TargetArgs,
        /// Gap between the taps in milliseconds
        #[arg(long, default_value = "200")]
        gap: u64,
    },

    /// Press and hold the center of an element
    LongPress {
        #[command(flatten)]
        target: TargetArgs,
        /// Hold time in milliseconds
        #[arg(long, default_value = "1000")]
        hold: u64,
    },

    /// Drag one element onto another (both by accessibility id)
    Drag {
        source: String,
        destination: String,
        /// Travel time in milliseconds
        #[arg(short, long, default_value = "1000")]
        duration: u64,
    },

    /// Pinch in or out around the center of an element
    Pinch {
        kind: PinchArg,
        #[command(flatten)]
        target: TargetArgs,
        /// Outer finger offset from the center, in pixels
        #[arg(long, default_value = "100")]
        distance: i32,
        /// Gesture duration in milliseconds
        #[arg(short, long, default_value = "1000")]
        duration: u64,
    },

    /// Fast fling across the screen or a container
    Swipe(StrokeArgs),

    /// Slower, shorter scroll across the screen or a container
    Scroll(StrokeArgs),

    /// Scroll repeatedly until an element reaches a state
    ScrollUntil {
        /// Direction: up, down, left, right
        direction: Direction,
        #[command(flatten)]
        target: TargetArgs,
        /// State to stop at
        #[arg(long, default_value = "visible")]
        until: UntilArg,
        /// Accessibility id of the container to scroll in
        #[arg(long)]
        within: Option<String>,
        /// Scroll attempts before giving up (defaults to the config value)
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Fraction of the area each scroll travels
        #[arg(long)]
        fraction: Option<f64>,
        /// Pause between attempts in milliseconds
        #[arg(long)]
        wait_between: Option<u64>,
    },

    /// Wait until an element reaches a state
    Wait {
        condition: WaitArg,
        #[command(flatten)]
        target: TargetArgs,
        /// Expected text for the `text` condition
        #[arg(long)]
        text: Option<String>,
        /// Timeout in milliseconds (defaults to the config value)
        #[arg(short = 'o', long)]
        timeout: Option<u64>,
        /// Poll interval in milliseconds (defaults to the config value)
        #[arg(long)]
        poll: Option<u64>,
    },

    /// Sleep for a fixed number of milliseconds
    Sleep { millis: u64 },

    /// Print the viewport size
    Viewport,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Connection(String),
    InteractionFailed(String),
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Connection(_) => ExitCode::from(2),
            CliError::InteractionFailed(_) => ExitCode::from(1),
            CliError::Usage(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CliError::InteractionFailed(msg) => write!(f, "Interaction failed: {}", msg),
            CliError::Usage(msg) => write!(f, "Usage error: {}", msg),
        }
    }
}

fn is_connection_fault(source: &SessionError) -> bool {
    matches!(
        source,
        SessionError::ConnectionLost(_) | SessionError::NotConnected
    )
}

impl From<InteractionError> for CliError {
    fn from(e: InteractionError) -> Self {
        match &e {
            InteractionError::Session { source, .. }
            | InteractionError::SessionDispatch { source, .. }
                if is_connection_fault(source) =>
            {
                CliError::Connection(e.to_string())
            }
            InteractionError::InvalidConfiguration { .. } => CliError::Usage(e.to_string()),
            _ => CliError::InteractionFailed(e.to_string()),
        }
    }
}

fn container(within: &Option<String>) -> Option<Target> {
    within
        .as_deref()
        .map(|id| Target::the(id).located_by(Locator::accessibility_id(id)))
}

fn by_id(id: &str) -> Target {
    Target::the(id).located_by(Locator::accessibility_id(id))
}

/// Builds the interaction a subcommand asks for.
///
/// Returns `None` for commands that are not interactions.
fn interaction_for(
    command: &Command,
    config: &TaplineConfig,
) -> Result<Option<Box<dyn Interaction>>, CliError> {
    let interaction: Box<dyn Interaction> = match command {
        Command::Tap { target } => Box::new(Tap::on(target.target())),
        Command::DoubleTap { target, gap } => {
            Box::new(DoubleTap::on(target.target()).with_gap(Duration::from_millis(*gap)))
        }
        Command::LongPress { target, hold } => {
            Box::new(LongPress::on(target.target()).for_duration(Duration::from_millis(*hold)))
        }
        Command::Drag {
            source,
            destination,
            duration,
        } => Box::new(
            Drag::the(by_id(source))
                .to(by_id(destination))
                .with_duration(Duration::from_millis(*duration)),
        ),
        Command::Pinch {
            kind,
            target,
            distance,
            duration,
        } => {
            let kind = match kind {
                PinchArg::In => PinchKind::In,
                PinchArg::Out => PinchKind::Out,
            };
            Box::new(
                Pinch::new(kind, target.target())
                    .with_distance(*distance)
                    .with_duration(Duration::from_millis(*duration)),
            )
        }
        Command::Swipe(args) => {
            let mut swipe = Swipe::towards(args.direction);
            if let Some(fraction) = args.fraction {
                swipe = swipe.by(fraction);
            }
            if let Some(ms) = args.duration {
                swipe = swipe.over(Duration::from_millis(ms));
            }
            if let Some(c) = container(&args.within) {
                swipe = swipe.within(c);
            }
            Box::new(swipe)
        }
        Command::Scroll(args) => {
            let mut scroll = Scroll::towards(args.direction);
            if let Some(fraction) = args.fraction {
                scroll = scroll.by(fraction);
            }
            if let Some(ms) = args.duration {
                scroll = scroll.over(Duration::from_millis(ms));
            }
            if let Some(c) = container(&args.within) {
                scroll = scroll.within(c);
            }
            Box::new(scroll)
        }
        Command::ScrollUntil {
            direction,
            target,
            until,
            within,
            max_attempts,
            fraction,
            wait_between,
        } => {
            let condition = match until {
                UntilArg::Visible => StopCondition::Visible,
                UntilArg::Clickable => StopCondition::Clickable,
                UntilArg::Gone => StopCondition::Disappears,
            };
            let mut builder = ScrollUntil::builder()
                .target(target.target())
                .direction(*direction)
                .condition(condition)
                .max_attempts(max_attempts.unwrap_or(config.scroll_max_attempts));
            if let Some(c) = container(within) {
                builder = builder.container(c);
            }
            if let Some(fraction) = fraction {
                builder = builder.fraction(*fraction);
            }
            if let Some(ms) = wait_between {
                builder = builder.wait_between(Duration::from_millis(*ms));
            }
            Box::new(builder.build()?)
        }
        Command::Wait {
            condition,
            target,
            text,
            timeout,
            poll,
        } => {
            let condition = match condition {
                WaitArg::Visible => WaitCondition::Visible,
                WaitArg::Clickable => WaitCondition::Clickable,
                WaitArg::Present => WaitCondition::Present,
                WaitArg::Invisible => WaitCondition::Invisible,
                WaitArg::Selected => WaitCondition::Selected,
                WaitArg::Text => WaitCondition::TextPresent,
            };
            let mut builder = Wait::builder()
                .condition(condition)
                .target(target.target())
                .timeout(timeout.map_or(config.wait_timeout(), Duration::from_millis))
                .poll_interval(poll.map_or(config.wait_poll_interval(), Duration::from_millis));
            if let Some(text) = text {
                builder = builder.text(text.as_str());
            }
            Box::new(builder.build()?)
        }
        Command::Sleep { millis } => Box::new(Wait::for_millis(*millis)),
        Command::Viewport | Command::Completions { .. } => return Ok(None),
    };
    Ok(Some(interaction))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "tapline", &mut std::io::stdout());
        return Ok(());
    }

    let config = TaplineConfig::load();

    // Validate before touching the network.
    let interaction = interaction_for(&cli.command, &config)?;

    let session: Box<dyn AutomationSession> = if matches!(cli.command, Command::Sleep { .. }) {
        debug!("sleeping without a device session");
        Box::new(DetachedSession)
    } else {
        Box::new(attach(&cli, &config)?)
    };

    let Some(interaction) = interaction else {
        return print_viewport(session.as_ref(), &cli).await;
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut actor = Actor::with_boxed_session("cli", session).with_cancellation(cancel);
    let result = actor.attempts_to(interaction.as_ref()).await;

    if let Some(path) = &cli.record {
        if let Err(e) = append_json_lines(path, actor.history()) {
            warn!(path = %path.display(), error = %e, "could not append interaction record");
        }
    }

    if let Some(record) = actor.history().last() {
        if cli.format == OutputFormat::Json {
            let line = serde_json::to_string_pretty(record)
                .map_err(|e| CliError::InteractionFailed(e.to_string()))?;
            println!("{}", line);
        } else if record.outcome.is_success() && !cli.quiet {
            let target = record
                .target
                .as_deref()
                .map(|t| format!(" '{}'", t))
                .unwrap_or_default();
            println!("{}{} ok ({}ms)", record.interaction, target, record.duration_ms);
        }
    }

    result.map_err(CliError::from)
}

/// Attaches to the configured WebDriver session.
fn attach(cli: &Cli, config: &TaplineConfig) -> Result<WebDriverSession, CliError> {
    let url = cli
        .webdriver_url
        .clone()
        .unwrap_or_else(|| config.webdriver_url.clone());
    let session_id = cli
        .session_id
        .clone()
        .or_else(|| config.session_id.clone())
        .ok_or_else(|| {
            CliError::Usage(
                "no session id; pass --session-id or set TAPLINE_SESSION_ID".to_string(),
            )
        })?;

    debug!(%url, %session_id, "attaching to session");
    WebDriverSession::attach(url, session_id).map_err(|e| CliError::Connection(e.to_string()))
}

async fn print_viewport(session: &dyn AutomationSession, cli: &Cli) -> Result<(), CliError> {
    let size = session.viewport_size().await.map_err(|e| {
        if is_connection_fault(&e) {
            CliError::Connection(e.to_string())
        } else {
            CliError::InteractionFailed(e.to_string())
        }
    })?;
    if cli.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::json!({ "width": size.width, "height": size.height })
        );
    } else {
        println!("{}x{}", size.width, size.height);
    }
    Ok(())
}
