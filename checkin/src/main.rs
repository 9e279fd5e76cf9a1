//! Terminal check-in desk.
//!
//! ## Usage
//!
//! ```bash
//! export RECEPTION_API_URL="https://reception.example.org"
//! export RECEPTION_API_KEY="your-key-here"
//! export RECEPTION_SCANNER_DEVICES="/dev/ttyACM0"
//! cargo run --bin checkin
//! ```
//!
//! The screen goes to stdout, logs to stderr.

use checkin::config::{AppSettings, FileSettingsStore, load_configuration};
use checkin::presentation::render;
use checkin::scanner::forward_decodes;
use checkin::shell::{self, Command, HELP, ParseError};
use checkin::{
    CheckinAction, CheckinReducer, HttpReceptionApi, LineCodeReader, ReceptionEnvironment,
    ReceptionState, ScanSession,
};
use reception_core::environment::SystemClock;
use reception_runtime::Store;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Commands typed ahead of the dispatcher before the prompt waits.
const COMMAND_QUEUE: usize = 32;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let settings = AppSettings::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings_store = Arc::new(FileSettingsStore::new(&settings.storage_path));
    let configuration = load_configuration(settings_store.as_ref(), &settings.seed).await;
    tracing::info!(
        storage = %settings_store.path().display(),
        devices = settings.scanner_devices.len(),
        "Starting check-in desk"
    );

    let api = Arc::new(HttpReceptionApi::new(configuration.clone()));
    let reader = Arc::new(LineCodeReader::new(settings.scanner_devices.clone()));
    let (session, decodes) = ScanSession::new(reader);
    let environment = ReceptionEnvironment::new(
        Arc::new(SystemClock),
        api,
        settings_store,
        Arc::new(session),
    );
    let store = Store::new(
        ReceptionState::new(configuration),
        CheckinReducer::new(),
        environment,
    );

    // Re-render after every reduced action that changed the screen
    let mut actions = store.subscribe_actions();
    let renderer = store.clone();
    tokio::spawn(async move {
        let mut last = String::new();
        loop {
            match actions.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    let screen = renderer.state(render).await;
                    if screen != last {
                        println!("{screen}");
                        last = screen;
                    }
                },
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Decodes go straight to the reducer, which drops them while a lookup runs
    let scanner_store = store.clone();
    tokio::spawn(forward_decodes(decodes, move |text| {
        let store = scanner_store.clone();
        let running = !store.is_shutting_down();
        tokio::spawn(async move {
            if let Err(error) = store.send(CheckinAction::CodeDecoded { text }).await {
                tracing::debug!(%error, "Decode dropped");
            }
        });
        async move { running }
    }));

    // Typed commands reach the store one at a time, in the order entered
    let (commands, queue) = mpsc::channel::<CheckinAction>(COMMAND_QUEUE);
    let dispatcher = tokio::spawn(shell::dispatch(store.clone(), queue));

    println!("{HELP}\n");
    commands.send(CheckinAction::Initialize).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match shell::parse(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(error) => {
                eprintln!("{error}");
                continue;
            },
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            },
            Command::Show => {
                println!("{}", store.state(render).await);
                continue;
            },
            _ => {},
        }

        match store.state(|state| command.into_action(state)).await {
            Ok(Some(action)) => commands.send(action).await?,
            Ok(None) => {},
            Err(error) => eprintln!("{error}"),
        }
    }

    // Let queued commands finish before tearing down
    drop(commands);
    dispatcher.await?;

    store.send(CheckinAction::StopScanning).await?;
    store.shutdown();
    println!("Goodbye!");
    Ok(())
}
