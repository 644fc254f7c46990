use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::{model::Session, server::ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the registration server.
    Server(ServerArgs),
    /// List the courses offered in a term.
    Load(LoadArgs),
    /// Register a student to a course.
    Register(RegisterArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Socket address the server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:1337")]
    pub listen: SocketAddr,

    /// Tab-separated course catalog (code, name, session).
    #[arg(long, default_value = "data/cours.txt")]
    pub catalog: PathBuf,

    /// Registration log, created on the first registration.
    #[arg(long, default_value = "data/inscription.txt")]
    pub registrations: PathBuf,

    /// Seconds to wait for each client frame. 0 waits forever.
    #[arg(long, default_value_t = 30)]
    pub read_timeout_secs: u64,
}

impl ServerArgs {
    pub fn into_config(self) -> ServerConfig {
        let read_timeout = match self.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        ServerConfig::new(self.listen, self.catalog, self.registrations)
            .with_read_timeout(read_timeout)
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Term to list: Automne, Hiver or Ete (case-insensitive).
    pub session: Session,

    /// Address of the registration server.
    #[arg(long, default_value = "127.0.0.1:1337")]
    pub server: SocketAddr,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Term the course is offered in.
    #[arg(long)]
    pub session: Session,

    /// Course code, as listed by `load`.
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    /// Six-digit student id.
    #[arg(long)]
    pub student_id: String,

    /// Address of the registration server.
    #[arg(long, default_value = "127.0.0.1:1337")]
    pub server: SocketAddr,
}
