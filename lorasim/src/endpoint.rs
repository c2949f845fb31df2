//! endpoint - the forwarder's one UDP socket, shared by every task

use crate::{DownlinkHandler, Error};
use async_std::net::{ToSocketAddrs, UdpSocket};
use async_std::sync::Mutex;
use async_trait::async_trait;
use slog::{Logger, info, warn};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use stop_token::StopToken;
use stop_token::prelude::*;

#[async_trait]
pub trait DatagramSocket: Send + Sync + 'static {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize>;
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl DatagramSocket for UdpSocket {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, datagram).await
    }
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buf).await
    }
}

pub struct Endpoint<S: DatagramSocket = UdpSocket> {
    socket: Arc<S>,
    // Held for the whole of each write so that datagrams from different tasks are never interleaved.
    write_lock: Arc<Mutex<()>>,
    max_datagram_size: usize,
    logger: Logger,
}

impl<S: DatagramSocket> Clone for Endpoint<S> {
    fn clone(&self) -> Self {
        Endpoint {
            socket: self.socket.clone(),
            write_lock: self.write_lock.clone(),
            max_datagram_size: self.max_datagram_size,
            logger: self.logger.clone(),
        }
    }
}

impl Endpoint<UdpSocket> {
    /// Resolve `address` and connect a UDP socket to it.
    pub async fn connect(
        address: &str,
        max_datagram_size: usize,
        logger: &Logger,
    ) -> Result<Self, Error> {
        let dial_error = |source| Error::Dial {
            address: address.to_string(),
            source,
        };
        let remote = address
            .to_socket_addrs()
            .await
            .map_err(dial_error)?
            .next()
            .ok_or_else(|| dial_error(io::Error::other("no addresses resolved")))?;
        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(dial_error)?;
        socket.connect(remote).await.map_err(dial_error)?;
        info!(
            logger,
            "Connected {} to network server {remote}",
            socket.local_addr().map_err(dial_error)?
        );
        Ok(Endpoint::new(socket, max_datagram_size, logger.clone()))
    }
}

impl<S: DatagramSocket> Endpoint<S> {
    pub fn new(socket: S, max_datagram_size: usize, logger: Logger) -> Self {
        Endpoint {
            socket: Arc::new(socket),
            write_lock: Arc::new(Mutex::new(())),
            max_datagram_size,
            logger,
        }
    }

    pub fn max_datagram_size(&self) -> usize {
        self.max_datagram_size
    }

    /// Write one datagram.  A failure is logged and returned; it is never fatal.
    pub async fn send(&self, datagram: &[u8]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        match self.socket.send(datagram).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(self.logger, "UDP send failed - {e}");
                Err(Error::Send(e))
            }
        }
    }

    // `buf` has room for one byte more than the limit, so that an oversized datagram
    // can be told apart from one that fits.
    async fn recv(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let bytes_read = self.socket.recv(buf).await.map_err(Error::Receive)?;
        if bytes_read > self.max_datagram_size {
            return Err(Error::TruncatedDatagram {
                limit: self.max_datagram_size,
            });
        }
        Ok(bytes_read)
    }

    /// Read and dispatch inbound datagrams until `stop` fires.
    pub async fn receive_loop(&self, handler: DownlinkHandler, stop: StopToken) {
        let mut buf = vec![0u8; self.max_datagram_size + 1];
        loop {
            let bytes_read = match self.recv(&mut buf).timeout_at(stop.clone()).await {
                Err(_) => break,
                Ok(Err(e)) => {
                    warn!(self.logger, "Failed to read UDP datagram - {e}");
                    continue;
                }
                Ok(Ok(n)) => n,
            };
            if let Err(e) = handler.handle(self, &buf[..bytes_read]).await {
                warn!(self.logger, "Dropped inbound datagram - {e}");
            }
        }
        info!(self.logger, "Receive loop stopped");
    }
}
