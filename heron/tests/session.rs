use std::{net::SocketAddr, sync::Arc, time::Duration};

use heron::{
	net::{listen, DEFAULT_IDLE_TIMEOUT},
	smtp::{args::Domain, Response, ResponseCode},
};
use tokio::{
	io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
	net::{
		tcp::{OwnedReadHalf, OwnedWriteHalf},
		TcpListener, TcpStream,
	},
	sync::watch,
	task::JoinHandle,
	time::timeout,
};

struct TestServer {
	addr: SocketAddr,
	shutdown: watch::Sender<bool>,
	task: JoinHandle<()>,
}

async fn start_server(idle_timeout: Duration) -> TestServer {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let host: Domain = "mx.heron.test".parse().unwrap();
	let (shutdown, rx) = watch::channel(false);

	let task = tokio::spawn(listen(listener, Arc::new(host), idle_timeout, rx));

	TestServer {
		addr,
		shutdown,
		task,
	}
}

struct Client {
	reader: BufReader<OwnedReadHalf>,
	writer: OwnedWriteHalf,
}

impl Client {
	async fn connect(addr: SocketAddr) -> Self {
		let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
		Self {
			reader: BufReader::new(reader),
			writer,
		}
	}

	async fn reply(&mut self) -> Option<Response> {
		let mut line = String::new();
		let read = timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
			.await
			.expect("server did not answer in time")
			.unwrap_or(0);

		if read == 0 {
			None
		} else {
			assert!(line.ends_with("\r\n"), "reply not CRLF terminated: {:?}", line);
			Some(line.parse().unwrap())
		}
	}

	async fn command(&mut self, line: &str) -> Response {
		self.writer
			.write_all(format!("{}\r\n", line).as_bytes())
			.await
			.unwrap();
		self.reply().await.expect("connection closed early")
	}
}

#[tokio::test]
async fn full_session_over_tcp() {
	let server = start_server(DEFAULT_IDLE_TIMEOUT).await;
	let mut client = Client::connect(server.addr).await;

	let greeting = client.reply().await.unwrap();
	assert_eq!(greeting.code(), ResponseCode::ServiceReady);
	assert!(greeting.messages()[0].starts_with("mx.heron.test "));

	let helo = client.command("HELO example.com").await;
	assert_eq!(helo.as_string(), "250 OK\r\n");

	let again = client.command("HELO example.org").await;
	assert_eq!(again.code(), ResponseCode::BadCommandSequence);

	let unknown = client.command("FOO bar").await;
	assert_eq!(unknown.as_string(), "500 unknown command: \"FOO\"\r\n");

	assert_eq!(client.command("RSET").await.code(), ResponseCode::Okay);
	assert_eq!(client.command("HELO example.org").await.code(), ResponseCode::Okay);

	let quit = client.command("QUIT").await;
	assert_eq!(quit.code(), ResponseCode::ServiceClosing);
	assert!(client.reply().await.is_none());
}

#[tokio::test]
async fn idle_connection_is_closed_without_reply() {
	let server = start_server(Duration::from_millis(200)).await;
	let mut client = Client::connect(server.addr).await;

	client.reply().await.unwrap();
	assert!(client.reply().await.is_none());
}

#[tokio::test]
async fn stalled_client_does_not_block_others() {
	let server = start_server(DEFAULT_IDLE_TIMEOUT).await;

	let mut stalled = Client::connect(server.addr).await;
	stalled.reply().await.unwrap();
	stalled.writer.write_all(b"HELO half-a-li").await.unwrap();

	let mut lively = Client::connect(server.addr).await;
	lively.reply().await.unwrap();
	assert_eq!(lively.command("HELO b.com").await.code(), ResponseCode::Okay);
	assert_eq!(
		lively.command("QUIT").await.code(),
		ResponseCode::ServiceClosing
	);
}

#[tokio::test]
async fn shutdown_stops_accepting_but_keeps_sessions() {
	let server = start_server(DEFAULT_IDLE_TIMEOUT).await;
	let mut client = Client::connect(server.addr).await;
	client.reply().await.unwrap();

	server.shutdown.send(true).unwrap();
	timeout(Duration::from_secs(5), server.task)
		.await
		.unwrap()
		.unwrap();

	assert!(TcpStream::connect(server.addr).await.is_err());
	assert_eq!(client.command("NOOP").await.code(), ResponseCode::Okay);
}
