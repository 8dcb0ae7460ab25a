use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
	io::{AsyncRead, AsyncWrite},
	net::TcpListener,
	sync::watch,
};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{config::Config, smtp::Server};

pub mod transport;

pub use transport::{LineTransport, TransportError, MAX_COMMAND_LINE};

/// How long a client may stay silent before its connection is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed accept, so a persistent error such as EMFILE does
/// not spin the loop.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

// runs as long as the client keeps talking. the idle timeout is re-armed
// for every line; a timeout or read error drops the stream without a reply.
pub async fn serve<S>(
	stream: S,
	config: Arc<dyn Config>,
	idle_timeout: Duration,
) -> Result<(), TransportError>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let mut transport = LineTransport::new(stream);
	let (mut server, greeting) = Server::initiate(config);
	transport.send(&greeting).await?;

	while !server.should_exit() {
		let response = match transport.read_line(idle_timeout).await {
			Ok(line) => server.push(&line),
			Err(TransportError::LineTooLong { max }) => server.line_too_long(max),
			Err(err) => return Err(err),
		};

		transport.send(&response).await?;
	}

	// the client already has its 221
	if let Err(err) = transport.shutdown().await {
		debug!(%err, "shutdown after QUIT failed");
	}

	Ok(())
}

// waits for new connections, hands every one to its own task and never
// stops over a single failed accept. a change on `shutdown` stops accepting;
// sessions already running are left to finish.
pub async fn listen(
	listener: TcpListener,
	config: Arc<dyn Config>,
	idle_timeout: Duration,
	mut shutdown: watch::Receiver<bool>,
) {
	loop {
		let accepted = tokio::select! {
			_ = shutdown.changed() => break,
			accepted = listener.accept() => accepted,
		};

		match accepted {
			Ok((stream, peer)) => {
				debug!(%peer, "accepted connection");
				tokio::spawn(supervise(stream, peer, config.clone(), idle_timeout));
			}
			Err(err) => accept_failed(&err).await,
		}
	}

	info!("no longer accepting connections");
}

async fn accept_failed(err: &io::Error) {
	warn!(%err, "failed to accept connection");
	tokio::time::sleep(ACCEPT_BACKOFF).await;
}

async fn supervise<S>(
	stream: S,
	peer: SocketAddr,
	config: Arc<dyn Config>,
	idle_timeout: Duration,
) where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	let span = info_span!("connection", %peer);
	let session = tokio::spawn(serve(stream, config, idle_timeout).instrument(span.clone()));

	let outcome = session.await;
	span.in_scope(|| match outcome {
		Ok(Ok(())) => debug!("session ended"),
		Ok(Err(err)) if err.is_timeout() => info!("closing idle connection"),
		Ok(Err(TransportError::ConnectionClosed)) => info!("client went away"),
		Ok(Err(err)) => warn!(%err, "connection failed"),
		Err(err) if err.is_panic() => error!("connection handler panicked"),
		Err(err) => warn!(%err, "connection handler did not finish"),
	});
}
