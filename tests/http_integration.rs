//! Driver-level integration tests against an in-process loopback
//! HTTP/1.1 server (spec §8's end-to-end scenarios). The teacher has no
//! equivalent of this — it never dials out — so these are grounded in
//! the retrieval pack's other networked crates, which place socket-level
//! integration tests under `tests/` rather than inline `#[cfg(test)]`.

use netfetch::{Client, FetchRequest, ParsedUrl, RecordingObserver};
use std::io::Write as _;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Binds a loopback listener and returns its address plus a task that
/// accepts exactly one connection and hands it to `respond`.
async fn one_shot_server<F, Fut>(respond: F) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        respond(stream).await;
    });
    (addr, handle)
}

async fn read_request_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        if let Some(pos) = find_header_end(&buf) {
            return buf[..pos].to_vec();
        }
        let n = stream.read(&mut tmp).await.unwrap();
        if n == 0 {
            return buf;
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn gzip(plain: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(plain).unwrap();
    enc.finish().unwrap()
}

#[tokio::test]
async fn simple_get_with_content_length() {
    let (addr, server) = one_shot_server(|mut stream| async move {
        let _ = read_request_head(&mut stream).await;
        let body = b"hello from the loopback server";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://{addr}/")).unwrap();
    let mut observer = RecordingObserver::default();
    client.fetch(FetchRequest::get(url), &mut observer).await.unwrap();

    assert_eq!(observer.body(), b"hello from the loopback server");
    assert!(observer.had_terminate());
    assert!(!observer.had_error());
    server.await.unwrap();
}

#[tokio::test]
async fn redirect_chain_to_final_200() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First connection: 301 to /final.
        let (mut first, _) = listener.accept().await.unwrap();
        let _ = read_request_head(&mut first).await;
        first
            .write_all(b"HTTP/1.1 301 Moved Permanently\r\nLocation: /final\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        first.shutdown().await.unwrap();

        // Second connection: the redirect target.
        let (mut second, _) = listener.accept().await.unwrap();
        let _ = read_request_head(&mut second).await;
        let body = b"landed";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        second.write_all(response.as_bytes()).await.unwrap();
        second.write_all(body).await.unwrap();
        second.shutdown().await.unwrap();
    });

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://{addr}/start")).unwrap();
    let mut observer = RecordingObserver::default();
    client.fetch(FetchRequest::get(url), &mut observer).await.unwrap();

    assert_eq!(observer.body(), b"landed");
    assert!(observer
        .events
        .iter()
        .any(|e| matches!(e, netfetch::ObserverEvent::MovedTo(loc) if loc.ends_with("/final"))));
    server.await.unwrap();
}

#[tokio::test]
async fn chunked_and_gzip_body_decodes_to_plain_text() {
    let plain = b"The quick brown fox jumps over the lazy dog, repeated a few times \
                  to make sure the gzip magic straddles a chunk boundary when split.";
    let compressed = gzip(plain);

    let (addr, server) = one_shot_server(move |mut stream| async move {
        let _ = read_request_head(&mut stream).await;
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        // Split the compressed payload into small chunks so the gzip
        // magic bytes straddle a chunk boundary, matching spec §8
        // scenario 4.
        for piece in compressed.chunks(2) {
            let header = format!("{:x}\r\n", piece.len());
            stream.write_all(header.as_bytes()).await.unwrap();
            stream.write_all(piece).await.unwrap();
            stream.write_all(b"\r\n").await.unwrap();
        }
        stream.write_all(b"0\r\n\r\n").await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://{addr}/")).unwrap();
    let mut observer = RecordingObserver::default();
    client.fetch(FetchRequest::get(url), &mut observer).await.unwrap();

    assert_eq!(observer.body(), plain);
    server.await.unwrap();
}

#[tokio::test]
async fn post_rejected_with_405_surfaces_post_no_good() {
    let (addr, server) = one_shot_server(|mut stream| async move {
        let _ = read_request_head(&mut stream).await;
        stream
            .write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://{addr}/submit")).unwrap();
    let body = netfetch::RequestBody::Form(b"a=1".to_vec());
    let mut observer = RecordingObserver::default();
    let result = client.fetch(FetchRequest::post(url, body), &mut observer).await;

    assert!(matches!(result, Err(netfetch::FetchError::PostNotSupported(405))));
    assert!(observer.events.contains(&netfetch::ObserverEvent::PostNoGood));
    server.await.unwrap();
}

#[tokio::test]
async fn url_userinfo_is_sent_as_authorization_on_the_first_request() {
    use base64::{engine::general_purpose::STANDARD, Engine};
    let expected = format!("Authorization: Basic {}\r\n", STANDARD.encode("Aladdin:opensesame"));

    let (addr, server) = one_shot_server(move |mut stream| async move {
        let head = read_request_head(&mut stream).await;
        let head_text = String::from_utf8_lossy(&head);
        assert!(head_text.contains(&expected));
        let body = b"ok";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        stream.shutdown().await.unwrap();
    })
    .await;

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://Aladdin:opensesame@{addr}/secret")).unwrap();
    let mut observer = RecordingObserver::default();
    client.fetch(FetchRequest::get(url), &mut observer).await.unwrap();

    assert_eq!(observer.body(), b"ok");
    server.await.unwrap();
}

#[tokio::test]
async fn keep_alive_connection_is_reused_across_two_fetches() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for _ in 0..2 {
            let _ = read_request_head(&mut stream).await;
            let body = b"ok";
            let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len());
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
        }
        // Only one connection should ever be accepted; dropping it here
        // proves the client reused it for the second request.
    });

    let client = Client::builder().build();
    let url = ParsedUrl::parse(&format!("http://{addr}/")).unwrap();

    let mut first = RecordingObserver::default();
    client.fetch(FetchRequest::get(url.clone()), &mut first).await.unwrap();
    assert_eq!(first.body(), b"ok");

    let mut second = RecordingObserver::default();
    client.fetch(FetchRequest::get(url), &mut second).await.unwrap();
    assert_eq!(second.body(), b"ok");

    server.await.unwrap();
}
