mod config;

use std::{process::ExitCode, sync::Arc};

use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "herond=info,heron=info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = match Config::get() {
		Ok(Some(config)) => config,
		Ok(None) => return ExitCode::SUCCESS,
		Err(err) => {
			error!(%err, "invalid configuration");
			return ExitCode::FAILURE;
		}
	};

	let listener = match TcpListener::bind(config.socket_address()).await {
		Ok(listener) => listener,
		Err(err) => {
			error!(%err, address = %config.socket_address(), "failed to bind");
			return ExitCode::FAILURE;
		}
	};

	info!(
		address = %config.socket_address(),
		hostname = %config.hostname,
		"serving SMTP"
	);

	let (tx, rx) = watch::channel(false);
	let idle_timeout = config.idle_timeout;
	let listen_task = tokio::spawn(heron::net::listen(
		listener,
		Arc::new(config),
		idle_timeout,
		rx,
	));

	shutdown_signal().await;
	info!("received shutdown signal, no longer accepting connections");

	// fails only if the listener has already stopped
	let _ = tx.send(true);
	if let Err(err) = listen_task.await {
		error!(%err, "listener task failed");
		return ExitCode::FAILURE;
	}

	ExitCode::SUCCESS
}

#[cfg(unix)]
async fn shutdown_signal() {
	use tokio::signal::unix::{signal, SignalKind};

	let mut terminate = match signal(SignalKind::terminate()) {
		Ok(terminate) => terminate,
		Err(err) => {
			error!(%err, "could not listen for SIGTERM");
			let _ = tokio::signal::ctrl_c().await;
			return;
		}
	};

	tokio::select! {
		_ = tokio::signal::ctrl_c() => (),
		_ = terminate.recv() => (),
	}
}

#[cfg(not(unix))]
async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
}
