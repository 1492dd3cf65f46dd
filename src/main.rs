use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use muloqot_sw::cache::{CacheStore, MemoryStorage, SqliteStorage};
use muloqot_sw::config::Config;
use muloqot_sw::http::{parse_header_line, Destination, Method, Request};
use muloqot_sw::logging;
use muloqot_sw::network::{Fetcher, HttpFetcher};
use muloqot_sw::poller::NotificationPoller;
use muloqot_sw::worker::{EventOutcome, ServiceWorker, WorkerEvent, WorkerSettings};

#[derive(Parser, Debug)]
#[command(name = "muloqot-sw")]
#[command(about = "Offline-first request worker for the Muloqot Plus web app")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/muloqot-sw/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Origin the app is served from (overrides the config file)
  #[arg(short, long, global = true)]
  origin: Option<Url>,

  /// Keep caches in memory for this run only
  #[arg(long, global = true)]
  no_persist: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Populate the static cache from the install manifest
  Install,
  /// Remove stale caches
  Activate,
  /// Answer a request the way the worker would and print the response
  Fetch {
    /// Absolute URL or path relative to the origin
    url: String,
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,
    /// Treat as a top-level page navigation
    #[arg(long)]
    navigate: bool,
    #[arg(short, long, value_enum, default_value_t = Destination::Empty)]
    destination: Destination,
    /// Request header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_parser = header_arg)]
    headers: Vec<(String, String)>,
    /// Request body
    #[arg(long)]
    data: Option<String>,
    /// Print status and headers only
    #[arg(long)]
    head: bool,
  },
  /// Show the notification for a push message
  Push {
    /// Message text (default: the welcome text)
    payload: Option<String>,
  },
  /// Route a notification click
  Click {
    /// Action name, e.g. explore or close
    action: Option<String>,
  },
  /// Run a background-sync event
  Sync {
    #[arg(default_value = muloqot_sw::worker::BACKGROUND_SYNC_TAG)]
    tag: String,
  },
  /// List caches and their entries
  Caches,
  /// Poll for notifications until interrupted
  Watch {
    /// Poll interval in seconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override origin if specified on command line
  let config = if let Some(origin) = args.origin {
    Config {
      origin: Some(origin),
      ..config
    }
  } else {
    config
  };

  let _log_guard = logging::init(&config.logging)?;

  let settings = WorkerSettings::from_config(&config)?;
  let fetcher = HttpFetcher::new(&config.network)?;

  if args.no_persist {
    let worker = ServiceWorker::new(MemoryStorage::new(), fetcher, settings);
    run(&worker, args.command).await
  } else {
    let storage = SqliteStorage::open(&config.db_path()?)?;
    let worker = ServiceWorker::new(storage, fetcher, settings);
    run(&worker, args.command).await
  }
}

async fn run<S: CacheStore, F: Fetcher>(worker: &ServiceWorker<S, F>, command: Command) -> Result<()> {
  let event = match command {
    Command::Install => WorkerEvent::Install,
    Command::Activate => WorkerEvent::Activate,
    Command::Fetch {
      url,
      method,
      navigate,
      destination,
      headers,
      data,
      head,
    } => {
      let url = worker.settings().resolve(&url)?;
      let request = if navigate {
        Request::navigate(url)
      } else {
        Request::get(url).with_destination(destination)
      };
      let mut request = request.with_method(method);
      for (name, value) in &headers {
        request = request.with_header(name, value.as_str());
      }
      if let Some(data) = data {
        request = request.with_body(data);
      }
      return match worker.dispatch(WorkerEvent::Fetch(request)).await? {
        EventOutcome::Response(response) => print_response(&response, head),
        other => Err(eyre!("Unexpected outcome for fetch: {:?}", other)),
      };
    }
    Command::Push { payload } => WorkerEvent::Push(payload),
    Command::Click { action } => WorkerEvent::NotificationClick(action),
    Command::Sync { tag } => WorkerEvent::Sync(tag),
    Command::Caches => return print_caches(worker.store()),
    Command::Watch { interval } => {
      let secs = interval.unwrap_or(worker.settings().notifications.poll_interval_secs);
      let mut poller = NotificationPoller::new(worker)?;
      return poller
        .run(Duration::from_secs(secs.max(1)), |notification| {
          if let Err(e) = print_json(notification) {
            tracing::warn!(error = %e, "failed to print notification");
          }
        })
        .await;
    }
  };

  match worker.dispatch(event).await? {
    EventOutcome::Installed(outcome) => print_json(&outcome),
    EventOutcome::Activated(outcome) => print_json(&outcome),
    EventOutcome::Notification(notification) => print_json(&notification),
    EventOutcome::Synced(outcome) => print_json(&outcome),
    EventOutcome::Clicked(outcome) => print_json(&outcome),
    EventOutcome::Response(response) => print_response(&response, false),
  }
}

fn header_arg(line: &str) -> std::result::Result<(String, String), String> {
  parse_header_line(line).map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value)
    .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
  println!("{}", json);
  Ok(())
}

fn print_response(response: &muloqot_sw::http::Response, head_only: bool) -> Result<()> {
  let mut out = std::io::stdout().lock();
  writeln!(out, "{} {}", response.status, response.status_text)?;
  for (name, value) in &response.headers {
    writeln!(out, "{}: {}", name, value)?;
  }
  if !head_only {
    writeln!(out)?;
    out.write_all(&response.body)?;
    writeln!(out)?;
  }
  Ok(())
}

fn print_caches<S: CacheStore>(store: &S) -> Result<()> {
  let names = store.list_names()?;
  if names.is_empty() {
    println!("(no caches)");
  }
  for name in names {
    let keys = store.keys(&name)?;
    println!("{} ({} entries)", name, keys.len());
    for key in keys {
      println!("  {}", key);
    }
  }
  Ok(())
}
