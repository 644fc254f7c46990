use std::{future::Future, net::SocketAddr, path::PathBuf, time::Duration};

use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogStore,
    connection::Connection,
    dispatch::Dispatcher,
    error::ServerError,
    handlers::{LoadHandler, RegisterHandler},
    registrations::RegistrationLog,
};

/// Pause after a failed `accept`, so a persistent failure such as running out
/// of file descriptors does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the server listens and which files back it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub catalog_path: PathBuf,
    pub registrations_path: PathBuf,
    /// Upper bound on each frame read; `None` lets a silent client hold the server.
    pub read_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn new(
        listen: SocketAddr,
        catalog_path: impl Into<PathBuf>,
        registrations_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            listen,
            catalog_path: catalog_path.into(),
            registrations_path: registrations_path.into(),
            read_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Dispatcher wired with the `LOAD` and `REGISTER` handlers.
    pub fn dispatcher(&self) -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(LoadHandler::new(CatalogStore::new(&self.catalog_path)))
            .register(RegisterHandler::new(RegistrationLog::new(
                &self.registrations_path,
            )));
        dispatcher
    }
}

/// Registration server. Services one connection at a time, one command per
/// connection.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    read_timeout: Option<Duration>,
}

impl Server {
    pub fn new(listener: TcpListener, dispatcher: Dispatcher) -> Self {
        Self {
            listener,
            dispatcher,
            read_timeout: None,
        }
    }

    /// Binds `config.listen` and wires the default handlers.
    pub async fn bind(config: &ServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen).await?;
        Ok(Self::new(listener, config.dispatcher()).with_read_timeout(config.read_timeout))
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Registers additional handlers after construction.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Serves connections forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Serves connections until `shutdown` resolves.
    ///
    /// Shutdown is only noticed between connections: the connection being
    /// serviced always runs to completion.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let Server {
            listener,
            dispatcher,
            read_timeout,
        } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    // Awaited inline: the next accept waits for this connection to finish.
                    handle_accept_result(accept_result, &dispatcher, read_timeout).await;
                }
            }
        }
    }

    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

async fn handle_accept_result(
    result: std::io::Result<(TcpStream, SocketAddr)>,
    dispatcher: &Dispatcher,
    read_timeout: Option<Duration>,
) {
    match result {
        Ok((stream, peer)) => {
            info!(peer = %peer, "client connected");
            let connection = Connection::from_stream(stream).with_read_timeout(read_timeout);
            match serve_connection(connection, dispatcher).await {
                Ok(()) => info!(peer = %peer, "client disconnected"),
                Err(err) => warn!(peer = %peer, error = %err, "connection dropped without a response"),
            }
        }
        Err(err) => {
            warn!(error = ?err, "failed to accept connection");
            sleep(ACCEPT_BACKOFF).await;
        }
    }
}

/// Runs one request cycle and closes the connection.
///
/// On error the connection is dropped, which closes the socket without a reply.
pub async fn serve_connection(
    mut connection: Connection,
    dispatcher: &Dispatcher,
) -> Result<(), ServerError> {
    listen(&mut connection, dispatcher).await?;
    connection.close().await?;
    Ok(())
}

/// Reads the command frame and hands it to the dispatcher.
pub async fn listen(connection: &mut Connection, dispatcher: &Dispatcher) -> Result<(), ServerError> {
    let command = connection.read_command().await?;
    debug!(verb = %command.verb, argument = %command.argument, "command received");
    dispatcher
        .dispatch(&command.verb, &command.argument, connection)
        .await
}
