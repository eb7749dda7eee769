//! Per-connection state machine: reads length-prefixed XML requests,
//! dispatches them, and writes raw XML replies. One task per connection;
//! a connection is strictly sequential, matching exchange-service's
//! original one-thread-per-client model translated to one-task-per-client.

use engine::Engine;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

const GENERIC_ERROR_REPLY: &str = "<results><error>Malformed request</error></results>";

/// Reads the decimal length line, then reads exactly that many bytes.
/// Returns `Ok(None)` on a graceful close (no bytes at all before the
/// length terminator), `Ok(Some(payload))` on a well-formed frame, and
/// `Err` for anything the spec calls out as connection-ending: a
/// non-numeric length, or a payload that's truncated or not UTF-8.
async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> std::io::Result<Option<Result<String, ()>>> {
    let mut length_buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            if length_buf.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Err(())));
        }
        if byte[0] == b'\n' {
            break;
        }
        length_buf.push(byte[0]);
    }

    let length_str = match std::str::from_utf8(&length_buf) {
        Ok(s) => s,
        Err(_) => return Ok(Some(Err(()))),
    };
    let length: usize = match length_str.trim().parse() {
        Ok(n) => n,
        Err(_) => return Ok(Some(Err(()))),
    };

    let mut payload = vec![0u8; length];
    if length > 0 {
        reader.read_exact(&mut payload).await.map_err(|_| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated payload"))?;
    }

    match String::from_utf8(payload) {
        Ok(xml) => Ok(Some(Ok(xml))),
        Err(_) => Ok(Some(Err(()))),
    }
}

#[instrument(skip(stream, engine), fields(peer = %peer))]
pub async fn handle_connection(stream: TcpStream, peer: std::net::SocketAddr, engine: std::sync::Arc<Engine>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    info!("connection accepted");

    loop {
        match read_frame(&mut reader).await {
            Ok(None) => {
                info!("client disconnected gracefully");
                break;
            }
            Ok(Some(Err(()))) => {
                warn!("malformed length or payload, closing connection");
                let _ = write_half.write_all(GENERIC_ERROR_REPLY.as_bytes()).await;
                break;
            }
            Ok(Some(Ok(xml))) => {
                debug!(bytes = xml.len(), "dispatching request");
                let reply = protocol::handle(&xml, &engine).await;
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    warn!("failed writing reply, closing connection");
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "I/O error reading request, closing connection");
                let _ = write_half.write_all(GENERIC_ERROR_REPLY.as_bytes()).await;
                break;
            }
        }
    }
}
