use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::Parser;
use synctray_core::DEFAULT_VISIBLE_ROWS;
use synctray_shell::{
    BridgeRequest, ConfigRelayChannel, DesktopNotifier, EventStreamClient, ShellController,
    StreamConfig,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "synctray")]
struct ShellArgs {
    /// Base URL of the local backup backend.
    #[arg(long, default_value = "http://localhost:8080")]
    backend_url: String,

    /// Number of visible file rows in the popup list.
    #[arg(long, default_value_t = DEFAULT_VISIBLE_ROWS)]
    rows: usize,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone)]
struct FileMakeWriter {
    file: Arc<Mutex<File>>,
}

struct FileWriterGuard {
    file: Arc<Mutex<File>>,
}

impl Write for FileWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut locked = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        locked.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut locked = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        locked.flush()
    }
}

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriterGuard {
            file: Arc::clone(&self.file),
        }
    }
}

fn init_logging(log_file: Option<&PathBuf>) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return;
    };

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to open log file {}: {err}", path.display());
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(FileMakeWriter {
            file: Arc::new(Mutex::new(file)),
        })
        .init();
}

#[tokio::main]
async fn main() {
    let args = ShellArgs::parse();
    init_logging(args.log_file.as_ref());

    let base_url = match Url::parse(&args.backend_url) {
        Ok(url) => url,
        Err(err) => {
            error!(backend_url = %args.backend_url, "invalid backend url: {err}");
            std::process::exit(2);
        }
    };

    if args.rows == 0 {
        error!("--rows must be at least 1");
        std::process::exit(2);
    }

    info!(backend_url = %base_url, rows = args.rows, "shell starting");

    let streams = EventStreamClient::new(StreamConfig::new(base_url.clone()));
    let relay = ConfigRelayChannel::new(base_url);
    let (controller, mut render_rx) = ShellController::new(args.rows, relay, DesktopNotifier);

    // The UI layer plugs in here: it holds the bridge sender and consumes
    // render commands. Until a window is attached, commands are logged.
    let (_bridge_tx, bridge_rx) = mpsc::unbounded_channel::<BridgeRequest>();
    tokio::spawn(async move {
        while let Some(command) = render_rx.recv().await {
            debug!(?command, "render");
        }
    });

    controller.run(&streams, bridge_rx).await;
    info!("shell stopped");
}
