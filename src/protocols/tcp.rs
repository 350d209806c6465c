use super::{protocol_error::ProtocolError, Protocol};
use std::{
    net::{SocketAddr, TcpStream},
    time::Duration,
};

/// Raw SCPI socket, usually port 5025.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tcp;

impl Protocol for Tcp {
    type IO = TcpStream;
    type Address = SocketAddr;
    fn connect(self, address: Self::Address, time_out: Duration) -> Result<Self::IO, ProtocolError> {
        log::info!("connecting to {} (timeout {:?})", address, time_out);
        let stream = TcpStream::connect_timeout(&address, time_out)?;
        stream.set_read_timeout(Some(time_out))?;
        stream.set_write_timeout(Some(time_out))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Read, net::TcpListener, time::Duration};

    use super::*;
    use crate::error::Error;

    #[test]
    fn silent_peer_reads_as_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let mut stream = Tcp.connect(address, Duration::from_millis(200)).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        let mut buf = [0u8; 16];
        let err: Error = stream.read(&mut buf).unwrap_err().into();
        assert!(err.is_timeout(), "{:?}", err);
    }
}
