//! Capture Pin CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use capture_pin::cli::{
    app::{load_merged_config, resolve_or_exit, run_recorder, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RemoteAction},
    config_cmd::handle_config_command,
    device_cmd::{handle_doctor, take_snapshot},
    presenter::Presenter,
    remote_cmd::{handle_remote_command, handle_upload, upload_settings},
};
use capture_pin::domain::session::human_readable_size;
use capture_pin::infrastructure::{HttpUploader, RpicamCapture, XdgConfigStore};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "capture_pin=debug" } else { "capture_pin=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut presenter = Presenter::new();

    let config = match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Doctor) => {
            return if handle_doctor(&presenter).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_ERROR)
            };
        }
        _ => load_merged_config(cli.to_config()).await,
    };

    let settings = match resolve_or_exit(&config, &presenter) {
        Ok(settings) => settings,
        Err(code) => return code,
    };

    match &cli.command {
        Some(Commands::Snap) => {
            let camera = RpicamCapture::new(settings.capture.clone());
            match take_snapshot(&camera, &settings.photo_dir, settings.capture.format).await {
                Ok((path, size)) => {
                    presenter.success(&format!(
                        "Saved {} ({})",
                        path.display(),
                        human_readable_size(size)
                    ));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Upload { file, server }) => {
            let upload = match upload_settings(&settings, server.as_deref()) {
                Ok(upload) => upload,
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };
            let uploader = HttpUploader::new(&upload);
            match handle_upload(&uploader, file, &mut presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Remote { action }) => {
            let server = match action {
                RemoteAction::List { server } | RemoteAction::Delete { server, .. } => server,
            };
            let upload = match upload_settings(&settings, server.as_deref()) {
                Ok(upload) => upload,
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            };
            let uploader = HttpUploader::new(&upload);
            match handle_remote_command(action, &uploader, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        _ => run_recorder(config, cli.keyboard).await,
    }
}
