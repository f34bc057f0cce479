//! Printer transports for sending raw print data
//!
//! Supports network printers (raw TCP, port 9100).

use crate::error::{PrintError, PrintResult};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Raw TCP printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Upper bound for any single transport operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for printer transports
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw print data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100. The host may
/// be an IP literal or a DNS name; names are resolved on every connect.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        // `[::1]` style literals are stored without brackets
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() || host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(PrintError::InvalidConfig(format!("Invalid printer host: {:?}", host)));
        }
        if host.contains(':') && host.parse::<IpAddr>().is_err() {
            return Err(PrintError::InvalidConfig(format!("Invalid printer host: {:?}", host)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create from a `host:port` string (e.g., "192.168.1.100:9100",
    /// "kitchen-printer.lan:9100" or "[fe80::1]:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        if let Ok(socket) = addr.parse::<SocketAddr>() {
            return Self::new(&socket.ip().to_string(), socket.port());
        }

        let invalid = || PrintError::InvalidConfig(format!("Invalid address: {}", addr));
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Self::new(host, port).map_err(|_| invalid())
    }

    /// Create from a configured interface string
    ///
    /// Accepts `tcp://host:port`, `host:port`, or a bare host (port 9100).
    pub fn from_interface(interface: &str) -> PrintResult<Self> {
        let trimmed = interface.trim();
        let rest = trimmed.strip_prefix("tcp://").unwrap_or(trimmed);
        let rest = rest.trim_end_matches('/');

        if rest.is_empty() {
            return Err(PrintError::InvalidConfig(format!(
                "Empty printer interface: {:?}",
                interface
            )));
        }

        // A bare IPv6 literal has colons but no port
        if rest.parse::<IpAddr>().is_ok() || !rest.contains(':') || rest.ends_with(']') {
            return Self::new(rest, DEFAULT_PORT);
        }
        Self::from_addr(rest)
    }

    /// Set transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Printable `host:port`
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn connect(&self) -> std::io::Result<TcpStream> {
        TcpStream::connect((self.host.as_str(), self.port)).await
    }

    async fn send(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = self
            .connect()
            .await
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr(), e)))?;

        debug!("Connected, sending {} bytes", data.len());

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;

        stream.flush().await?;
        Ok(())
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        // One deadline covers name lookup, connect, write and flush
        tokio::time::timeout(self.timeout, self.send(data))
            .await
            .map_err(|_| PrintError::Timeout(format!("Print timeout: {}", self.addr())))??;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr()))]
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.connect()).await {
            Ok(Ok(_)) => {
                debug!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_host_and_port_forms_agree() {
        let a = NetworkPrinter::new("10.0.0.7", 9101).unwrap();
        let b = NetworkPrinter::from_addr("10.0.0.7:9101").unwrap();
        assert_eq!(a.addr(), b.addr());
        assert_eq!(b.addr(), "10.0.0.7:9101");
    }

    #[test]
    fn test_from_interface() {
        let p = NetworkPrinter::from_interface("tcp://10.0.0.7:9101").unwrap();
        assert_eq!(p.port(), 9101);

        let p = NetworkPrinter::from_interface("10.0.0.7").unwrap();
        assert_eq!(p.port(), DEFAULT_PORT);
        assert_eq!(p.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_interface_accepts_host_names() {
        let p = NetworkPrinter::from_interface("localhost").unwrap();
        assert_eq!((p.host(), p.port()), ("localhost", DEFAULT_PORT));

        let p = NetworkPrinter::from_interface("tcp://localhost:9100").unwrap();
        assert_eq!((p.host(), p.port()), ("localhost", 9100));

        let p = NetworkPrinter::from_interface("kitchen-printer.lan:9101/").unwrap();
        assert_eq!(p.addr(), "kitchen-printer.lan:9101");
    }

    #[test]
    fn test_from_interface_ipv6() {
        let p = NetworkPrinter::from_interface("tcp://[fe80::1]:9101").unwrap();
        assert_eq!((p.host(), p.port()), ("fe80::1", 9101));
        assert_eq!(p.addr(), "[fe80::1]:9101");

        let p = NetworkPrinter::from_interface("[::1]").unwrap();
        assert_eq!((p.host(), p.port()), ("::1", DEFAULT_PORT));

        let p = NetworkPrinter::from_interface("::1").unwrap();
        assert_eq!(p.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_addr() {
        assert!(NetworkPrinter::from_addr("invalid").is_err());
        assert!(NetworkPrinter::from_addr("printer:port").is_err());
        assert!(NetworkPrinter::from_addr(":9100").is_err());
        assert!(NetworkPrinter::from_interface("tcp://").is_err());
        assert!(NetworkPrinter::from_interface("kitchen printer").is_err());
        assert!(NetworkPrinter::from_interface("printer:9100:9100").is_err());
    }

    #[tokio::test]
    async fn test_print_by_host_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let printer = NetworkPrinter::from_interface(&format!("tcp://localhost:{}", port)).unwrap();
        assert!(printer.print(b"by name\n").await.is_ok());

        assert_eq!(server.await.unwrap(), b"by name\n");
    }

    #[tokio::test]
    async fn test_print_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let printer = NetworkPrinter::from_addr(&addr.to_string()).unwrap();
        assert!(printer.print(b"hello\n").await.is_ok());
        drop(printer);

        let received = server.await.unwrap();
        assert_eq!(received, b"hello\n");
    }

    #[tokio::test]
    async fn test_offline_printer_reports_false() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let printer = NetworkPrinter::from_addr(&addr.to_string())
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        assert!(!printer.is_online().await);
        assert!(printer.print(b"x").await.is_err());
    }
}
