//! Command-line interface for strictly_chess_server.

use clap::{Parser, Subcommand};

/// Strictly Chess - real-time two-player chess over WebSocket
#[derive(Parser, Debug)]
#[command(name = "strictly_chess_server")]
#[command(about = "Real-time two-player chess server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "strictly_chess_server",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ])
        .expect("parses");
        let Command::Serve { host, port, config } = cli.command;
        assert_eq!(host.as_deref(), Some("0.0.0.0"));
        assert_eq!(port, Some(8080));
        assert!(config.is_none());
    }

    #[test]
    fn test_serve_defaults_to_config() {
        let cli = Cli::try_parse_from(["strictly_chess_server", "serve"]).expect("parses");
        let Command::Serve { host, port, .. } = cli.command;
        assert!(host.is_none());
        assert!(port.is_none());
    }
}
