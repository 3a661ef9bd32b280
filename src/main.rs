//! visionctl - query and administer a running vision manager

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vision_controller_client::{
    defaults, ClientConfig, Response, TaskFilter, VisionControllerClient,
};
use vision_shared::{StopTaskOptions, TaskSelection};

#[derive(Parser)]
#[command(name = "visionctl", version, about = "Talk to a vision manager")]
struct Cli {
    /// Vision manager host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Command port; configuration and status ports are derived from it
    #[arg(long, default_value_t = defaults::COMMAND_PORT)]
    port: u16,

    /// Caller id attached to every request
    #[arg(long)]
    caller_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Health check over the configuration channel
    Ping,
    /// Cancel the running command
    Cancel,
    /// Stop the vision manager
    Quit,
    /// Query the state of a task
    TaskState(FilterArgs),
    /// Fetch the published state
    PublishedState {
        /// Read from the status publisher instead of asking the service
        #[arg(long)]
        subscribe: bool,
    },
    /// Latest detected objects
    DetectedObjects(FilterArgs),
    /// Vision statistics
    Statistics(FilterArgs),
    /// Stop tasks
    StopTask {
        #[arg(long)]
        task_id: Option<String>,
        #[arg(long)]
        task_type: Option<String>,
        /// Do not wait for a reply
        #[arg(long)]
        fire_and_forget: bool,
    },
    /// Set component log levels, e.g. `visionmanager=DEBUG`
    SetLogLevel {
        #[arg(required = true, value_parser = parse_level)]
        levels: Vec<(String, String)>,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    task_id: Option<String>,
    #[arg(long)]
    cycle_index: Option<String>,
    #[arg(long)]
    task_type: Option<String>,
}

impl From<FilterArgs> for TaskFilter {
    fn from(args: FilterArgs) -> Self {
        TaskFilter {
            task_id: args.task_id,
            cycle_index: args.cycle_index,
            task_type: args.task_type,
        }
    }
}

fn parse_level(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(component, level)| (component.to_owned(), level.to_owned()))
        .ok_or_else(|| format!("expected COMPONENT=LEVEL, got `{s}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig {
        caller_id: cli.caller_id.clone(),
        ..ClientConfig::new(cli.host.clone(), cli.port)
    };
    info!("Vision manager at {}", config.command_address());

    let mut client = VisionControllerClient::new(config).context("invalid vision manager address")?;

    // Abort any in-progress wait on Ctrl-C
    let destroy = client.destroy_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, aborting");
            destroy.trigger();
        }
    });

    let result = run(&mut client, cli.command, cli.timeout.map(Duration::from_secs_f64)).await;
    client.destroy().await;
    result
}

async fn run(
    client: &mut VisionControllerClient,
    command: Cmd,
    timeout: Option<Duration>,
) -> Result<()> {
    let command_timeout = timeout.unwrap_or(defaults::COMMAND_TIMEOUT);
    let service_timeout = timeout.unwrap_or(defaults::SERVICE_TIMEOUT);

    let response = match command {
        Cmd::Ping => client.ping(command_timeout).await.context("ping failed")?,
        Cmd::Cancel => client.cancel(command_timeout).await.context("cancel failed")?,
        Cmd::Quit => client.quit(command_timeout).await.context("quit failed")?,
        Cmd::TaskState(filter) => client
            .get_task_state(&filter.into(), service_timeout)
            .await
            .context("task state query failed")?,
        Cmd::PublishedState { subscribe: true } => {
            match client.get_published_state(timeout).await? {
                Some(state) => Response::Json(state),
                None => {
                    info!("No state published");
                    return Ok(());
                }
            }
        }
        Cmd::PublishedState { subscribe: false } => client
            .get_published_state_service(service_timeout)
            .await
            .context("published state query failed")?,
        Cmd::DetectedObjects(filter) => client
            .get_latest_detected_objects(&filter.into(), command_timeout)
            .await
            .context("detected objects query failed")?,
        Cmd::Statistics(filter) => client
            .get_vision_statistics(&filter.into(), command_timeout)
            .await
            .context("statistics query failed")?,
        Cmd::StopTask {
            task_id,
            task_type,
            fire_and_forget,
        } => {
            let options = StopTaskOptions {
                selection: TaskSelection {
                    task_id,
                    task_type,
                    ..TaskSelection::default()
                },
                fire_and_forget,
                timeout: command_timeout,
                ..StopTaskOptions::default()
            };
            match client.stop_task(&options).await.context("stop task failed")? {
                Some(response) => response,
                None => {
                    info!("Stop request sent");
                    return Ok(());
                }
            }
        }
        Cmd::SetLogLevel { levels } => {
            let levels: BTreeMap<String, String> = levels.into_iter().collect();
            client
                .set_log_level(&levels, command_timeout)
                .await
                .context("set log level failed")?
        }
    };

    print_response(&response)
}

fn print_response(response: &Response) -> Result<()> {
    match response {
        Response::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
        Response::Raw(bytes) => println!("<{} bytes>", bytes.len()),
    }
    Ok(())
}
