// src/main.rs - Command line host for the GPIO drivers
use clap::{Args, Parser, Subcommand};
use gripper_gpio::config;
use gripper_gpio::{Context, Extra, Host, Registry};
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

type CliError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "gripper-gpio", version, about = "Drive GPIO grippers, switches and buttons")]
struct Cli {
    /// Module configuration file
    #[arg(short, long, default_value = "gripper.toml")]
    config: PathBuf,

    /// Log every pin write
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Per-call options shared by the actuating commands.
#[derive(Debug, Args)]
struct CallOptions {
    /// Replay the pin sequence even if already there
    #[arg(long)]
    force: bool,

    /// Extra options as a JSON object, e.g. '{"force":true}'
    #[arg(long)]
    extra: Option<String>,
}

impl CallOptions {
    fn extra(&self) -> Result<Extra, serde_json::Error> {
        let parsed = match &self.extra {
            Some(json) => Extra::from_value(Some(&serde_json::from_str::<Value>(json)?)),
            None => Extra::default(),
        };
        Ok(Extra {
            force: self.force || parsed.force,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List configured components and known models
    List,
    /// Close a gripper
    Grab {
        name: String,
        #[command(flatten)]
        options: CallOptions,
    },
    /// Open a gripper
    Open {
        name: String,
        #[command(flatten)]
        options: CallOptions,
    },
    /// Press a button
    Push {
        name: String,
        #[command(flatten)]
        options: CallOptions,
    },
    /// Move a switch to a position (0 is off)
    SetPosition {
        name: String,
        position: u32,
        #[command(flatten)]
        options: CallOptions,
    },
    /// Show the current position of a switch
    GetPosition { name: String },
    /// Show the positions a switch supports
    Positions { name: String },
    /// Send a JSON command, e.g. '{"cycle": true, "max": 3}'
    DoCommand {
        name: String,
        /// Rejoined with single spaces, so an unquoted payload may contain spaces
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        json: Vec<String>,
    },
    /// Read commands from stdin, one per line, against a single host
    Shell,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let module = config::load_config(&cli.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", cli.config.display(), e);
        Box::new(e) as CliError
    })?;

    let mut host = Host::from_config(Registry::with_builtin_models(), &module)?;

    let (ctx, cancel) = Context::with_cancel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupted, cancelling in-flight operation");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });

    let result = match cli.command {
        Command::Shell => shell(&mut host, &ctx, BufReader::new(tokio::io::stdin())).await,
        command => run(&mut host, &ctx, command).await,
    };
    host.close_all().await;
    result
}

/// Runs one command per input line until end of input or cancellation.
async fn shell<R: AsyncBufRead + Unpin>(host: &mut Host, ctx: &Context, input: R) -> Result<(), CliError> {
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::info!("Shell cancelled");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if matches!(command, Command::Shell) {
            continue;
        }
        if let Err(e) = run(host, ctx, command).await {
            tracing::error!("{}", e);
        }
    }
    Ok(())
}

async fn run(host: &mut Host, ctx: &Context, command: Command) -> Result<(), CliError> {
    match command {
        Command::List => {
            for (name, api, model) in host.names() {
                println!("{name}\t{api}\t{model}");
            }
            for board in host.dependencies().board_names() {
                println!("{board}\tboard");
            }
        }
        Command::Grab { name, options } => {
            let holding = host.gripper(&name)?.grab(ctx, &options.extra()?).await?;
            println!("{name}: grabbed (holding: {holding})");
        }
        Command::Open { name, options } => {
            host.gripper(&name)?.open(ctx, &options.extra()?).await?;
            println!("{name}: opened");
        }
        Command::Push { name, options } => {
            host.button(&name)?.push(ctx, &options.extra()?).await?;
            println!("{name}: pushed");
        }
        Command::SetPosition { name, position, options } => {
            host.switch(&name)?.set_position(ctx, position, &options.extra()?).await?;
            println!("{name}: position {position}");
        }
        Command::GetPosition { name } => {
            let position = host.switch(&name)?.get_position(ctx, &Extra::default()).await?;
            println!("{name}: position {position}");
        }
        Command::Positions { name } => {
            let (count, labels) = host
                .switch(&name)?
                .get_number_of_positions(ctx, &Extra::default())
                .await?;
            println!("{name}: {count} positions [{}]", labels.join(", "));
        }
        Command::DoCommand { name, json } => {
            let cmd: Value = serde_json::from_str(&json.join(" "))?;
            let response = host.component(&name)?.do_command(ctx, &cmd).await?;
            println!("{name}: {response}");
        }
        Command::Shell => {}
    }
    Ok(())
}
