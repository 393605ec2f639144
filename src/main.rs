use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tokio::sync::mpsc;

use healthy::app::App;
use healthy::config::{Config, load_config, load_config_from_path};
use healthy::event::{Event, EventHandler};
use healthy::logging::{LogSettings, init_tracing};
use healthy::sampler::{Sampler, SamplerConfig, worker};
use healthy::system::platform::{self, SourceOptions};
use healthy::ui;

const UI_TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(
    name = "healthy",
    about = "Ranks the top CPU, memory, network and I/O consumers over a rolling window"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grouping mode: pid, ppid, name
    #[arg(long)]
    group_by: Option<String>,

    /// Seconds between the two snapshots of a cycle
    #[arg(long)]
    sample_seconds: Option<f64>,

    /// Seconds of history kept per entry
    #[arg(long)]
    window_seconds: Option<f64>,

    /// Track CPU only
    #[arg(long, default_value_t = false)]
    only_cpu: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print this many cycle reports as JSON lines and exit, without a terminal UI.
    #[arg(long)]
    json_cycles: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    let headless = cli.json_cycles.is_some();
    if let Some(settings) = LogSettings::resolve(&config.logging, headless) {
        init_tracing(&settings)?;
    }

    let sampler_config = config.sampler_config(platform::page_size(), platform::logical_cores())?;
    let options = SourceOptions {
        network: config.network.enabled,
        ss_timeout: Duration::from_millis(config.network.ss_timeout_ms),
    };
    let sampler = Sampler::new(platform::default_source(&options), sampler_config.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = worker::spawn(sampler, tx)?;

    let result = match cli.json_cycles {
        Some(cycles) => run_json_cycles(rx, cycles).await,
        None => {
            let mut terminal = ratatui::init();
            let result = run(&mut terminal, &config, &sampler_config, rx).await;
            ratatui::restore();
            result
        }
    };

    // The sampler may be mid-sleep; it exits on its own once it sees the flag.
    handle.stop();
    result
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    config: &Config,
    sampler_config: &SamplerConfig,
    cycles: mpsc::UnboundedReceiver<healthy::sampler::CycleReport>,
) -> Result<()> {
    let mut app = App::new(config, sampler_config);
    let mut events = EventHandler::new(UI_TICK, cycles);

    terminal.draw(|frame| ui::draw(frame, &app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        let should_draw = match event {
            Event::Key(key) => {
                if key.kind == crossterm::event::KeyEventKind::Press {
                    let action = app.map_key(key);
                    app.dispatch(action);
                    true
                } else {
                    false
                }
            }
            Event::Cycle(report) => {
                app.apply_report(*report);
                true
            }
            Event::Tick => {
                let had_status = app.status_message.is_some();
                app.on_tick();
                had_status && app.status_message.is_none()
            }
            Event::Resize => true,
        };
        if should_draw {
            terminal.draw(|frame| ui::draw(frame, &app))?;
        }
    }

    Ok(())
}

async fn run_json_cycles(
    mut cycles: mpsc::UnboundedReceiver<healthy::sampler::CycleReport>,
    count: u64,
) -> Result<()> {
    let stdout = std::io::stdout();
    for _ in 0..count {
        let report = cycles
            .recv()
            .await
            .ok_or_else(|| eyre!("sampler stopped before producing {count} cycles"))?;
        let line = serde_json::to_string(&report)?;
        let mut out = stdout.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
    }
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref mode) = cli.group_by {
        config.general.group_by = mode.clone();
    }
    if let Some(secs) = cli.sample_seconds {
        config.general.sample_seconds = secs;
    }
    if let Some(secs) = cli.window_seconds {
        config.general.window_seconds = secs;
    }
    if cli.only_cpu {
        config.general.only_cpu = true;
    }
    if let Some(ref path) = cli.log_file {
        config.logging.file = Some(path.clone());
    }

    config
}
