//! Port scanning for the listening socket.

use std::io;
use tokio::net::TcpListener;
use tracing::info;

fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
    )
}

/// Bind `host:base_port`, moving up one port at a time when the port is taken
/// or not permitted.
///
/// # Arguments
/// - `host`: Interface to bind.
/// - `base_port`: First port tried; `0` asks the OS for any free port.
/// - `attempts`: How many further ports to try after the first.
///
/// # Errors
/// Returns the last bind error once the attempts run out, or immediately for
/// errors other than address-in-use and permission-denied.
pub async fn bind_first_available(
    host: &str,
    base_port: u16,
    attempts: u16,
) -> io::Result<TcpListener> {
    let mut port = base_port;
    let mut remaining = attempts;
    loop {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if is_retryable(&err) && remaining > 0 && port < u16::MAX => {
                info!("Port {} unavailable ({}), trying {}", port, err, port + 1);
                port += 1;
                remaining -= 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bind_first_available;

    #[tokio::test]
    async fn skips_an_occupied_port() {
        let taken = bind_first_available("127.0.0.1", 0, 0).await.expect("bind");
        let taken_port = taken.local_addr().expect("addr").port();

        let next = bind_first_available("127.0.0.1", taken_port, 20)
            .await
            .expect("next free port");
        let port = next.local_addr().expect("addr").port();
        assert!(port > taken_port && port <= taken_port.saturating_add(20));
    }

    #[tokio::test]
    async fn gives_up_without_attempts() {
        let taken = bind_first_available("127.0.0.1", 0, 0).await.expect("bind");
        let taken_port = taken.local_addr().expect("addr").port();

        let err = bind_first_available("127.0.0.1", taken_port, 0)
            .await
            .expect_err("occupied port with no retries");
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }
}
