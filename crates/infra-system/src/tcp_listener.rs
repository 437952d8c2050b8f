// TCP request listener
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use ewd_core::error::{AppError, Result};
use ewd_core::port::RequestListener;

const READ_CHUNK: usize = 512;

/// Listening TCP socket handing out one request per connection
pub struct TcpRequestListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpRequestListener {
    /// Bind and listen on `addr`
    ///
    /// # Errors
    /// - AppError::ListenSetup if the socket cannot be created, bound or put in listening mode
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::ListenSetup(format!("{}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AppError::ListenSetup(format!("{}: {}", addr, e)))?;

        info!(addr = %local_addr, "Listening for job submissions");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl RequestListener for TcpRequestListener {
    type Connection = TcpStream;

    async fn accept(&mut self) -> io::Result<Option<TcpStream>> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(peer = %peer, "Accepted connection");
        Ok(Some(stream))
    }

    async fn read_request(&mut self, conn: &mut TcpStream, max_len: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = conn.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if chunk[..n].contains(&b'\n') || buf.len() > max_len {
                break;
            }
        }

        buf.truncate(max_len + 1);
        Ok(buf)
    }
}
