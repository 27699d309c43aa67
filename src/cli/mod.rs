use std::net::{IpAddr, SocketAddr};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "multicab-inventory")]
#[command(about = "Multicab Inventory API - accessories, materials, multicabs and staff accounts")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    pub port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0", help = "Interface to bind")]
    pub bind: IpAddr,

    #[arg(long, help = "Do not apply pending database migrations at start-up")]
    pub skip_migrations: bool,
}

impl Cli {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["multicab-inventory", "--port", "8080", "--bind", "127.0.0.1", "--skip-migrations"]).unwrap();
        assert_eq!(cli.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(cli.skip_migrations);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(Cli::try_parse_from(["multicab-inventory", "--bind", "not-an-ip"]).is_err());
    }
}
