// Request Listener Port
// Accepts submitter connections and reads one request from each

use async_trait::async_trait;

/// Source of submitter connections
///
/// Implementations:
/// - TcpRequestListener (infra-system): `tokio::net::TcpListener`
/// - ChannelListener: in-memory requests for tests
#[async_trait]
pub trait RequestListener: Send {
    /// One accepted connection; dropping it closes the connection
    type Connection: Send;

    /// Wait for the next connection
    ///
    /// Returns `Ok(None)` once the listener is closed and no further
    /// connections can arrive. Must be cancel-safe: the scheduler races it
    /// against its poll interval.
    async fn accept(&mut self) -> std::io::Result<Option<Self::Connection>>;

    /// Read a single request from `conn`
    ///
    /// Reads until a newline, EOF, or more than `max_len` bytes have been
    /// received (the excess byte is kept so the caller can detect oversize
    /// requests). Callers bound this with their read timeout.
    async fn read_request(
        &mut self,
        conn: &mut Self::Connection,
        max_len: usize,
    ) -> std::io::Result<Vec<u8>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use tokio::sync::mpsc;

    /// What the test wants a connection to deliver
    #[derive(Debug, Clone)]
    pub enum MockConnection {
        /// Connection delivers these bytes
        Bytes(Vec<u8>),
        /// Client connects and never sends anything
        Silent,
    }

    /// In-memory listener fed through an mpsc channel
    ///
    /// Dropping every [`ChannelSubmitter`] closes the listener.
    pub struct ChannelListener {
        rx: mpsc::UnboundedReceiver<MockConnection>,
    }

    /// Test-side handle that "connects" and submits requests
    #[derive(Clone)]
    pub struct ChannelSubmitter {
        tx: mpsc::UnboundedSender<MockConnection>,
    }

    impl ChannelSubmitter {
        pub fn send(&self, request: impl Into<Vec<u8>>) {
            let _ = self.tx.send(MockConnection::Bytes(request.into()));
        }

        pub fn connect_silently(&self) {
            let _ = self.tx.send(MockConnection::Silent);
        }
    }

    pub fn channel_listener() -> (ChannelSubmitter, ChannelListener) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSubmitter { tx }, ChannelListener { rx })
    }

    #[async_trait]
    impl RequestListener for ChannelListener {
        type Connection = MockConnection;

        async fn accept(&mut self) -> std::io::Result<Option<MockConnection>> {
            Ok(self.rx.recv().await)
        }

        async fn read_request(
            &mut self,
            conn: &mut MockConnection,
            max_len: usize,
        ) -> std::io::Result<Vec<u8>> {
            match conn {
                MockConnection::Bytes(bytes) => {
                    let mut out = bytes.clone();
                    if let Some(pos) = out.iter().position(|b| *b == b'\n') {
                        out.truncate(pos + 1);
                    }
                    out.truncate(max_len + 1);
                    Ok(out)
                }
                MockConnection::Silent => {
                    std::future::pending::<()>().await;
                    Ok(Vec::new())
                }
            }
        }
    }
}
