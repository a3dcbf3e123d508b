// Server loop module
// Accepts connections until the shutdown signal fires

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept connections on `listener` and hand each to its own task.
///
/// Returns once `shutdown` is notified. Connections already being served
/// keep running in their tasks until they finish or the runtime stops.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    shutdown: Arc<Notify>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveSource;
    use crate::config::tests::test_config;
    use crate::server::create_listener;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: std::net::SocketAddr, target: &str) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    fn split_response(response: &[u8]) -> (String, Vec<u8>) {
        let end = response
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        let head = String::from_utf8_lossy(&response[..end]).to_string();
        (head, response[end + 4..].to_vec())
    }

    #[tokio::test]
    async fn test_serves_ranges_over_tcp_until_shutdown() {
        let mut archive = tempfile::NamedTempFile::new().unwrap();
        archive.write_all(&(0..100).collect::<Vec<u8>>()).unwrap();
        archive.flush().unwrap();
        let www = tempfile::tempdir().unwrap();

        let mut cfg = test_config();
        cfg.static_files.root = www.path().display().to_string();
        let state = Arc::new(config::AppState::new(
            cfg,
            ArchiveSource::open(archive.path()).unwrap(),
        ));

        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(listener, state, Arc::clone(&shutdown)));

        let (head, body) = split_response(&get(addr, "/zim?10,5").await);
        assert!(head.starts_with("HTTP/1.1 200"));
        assert!(head.to_ascii_lowercase().contains("content-type: application/octet-stream"));
        assert_eq!(body, vec![10, 11, 12, 13, 14]);

        let (head, body) = split_response(&get(addr, "/zim?0,99999999999").await);
        assert!(head.starts_with("HTTP/1.1 200"));
        assert!(!head.to_ascii_lowercase().contains("content-type"));
        assert!(body.is_empty());

        let (head, _) = split_response(&get(addr, "/missing.js").await);
        assert!(head.starts_with("HTTP/1.1 404"));

        shutdown.notify_one();
        tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server loop stops on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_clients() {
        let mut archive = tempfile::NamedTempFile::new().unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        archive.write_all(&data).unwrap();
        archive.flush().unwrap();

        let state = Arc::new(config::AppState::new(
            test_config(),
            ArchiveSource::open(archive.path()).unwrap(),
        ));
        let listener = create_listener("127.0.0.1:0".parse().unwrap(), 64).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(listener, state, Arc::clone(&shutdown)));

        let mut clients = Vec::new();
        for i in 0..16usize {
            let offset = (i % 4) * 2000 + i;
            let length = 300 + i * 10;
            clients.push(tokio::spawn(async move {
                let (_, body) = split_response(&get(addr, &format!("/zim?{offset},{length}")).await);
                (offset, length, body)
            }));
        }

        for client in clients {
            let (offset, length, body) = client.await.unwrap();
            assert_eq!(body.len(), length);
            assert_eq!(body, data[offset..offset + length]);
        }

        shutdown.notify_one();
        server.await.unwrap();
    }
}
