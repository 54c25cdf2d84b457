//! Integration tests for the WebSocket transport.
//!
//! A real listener on an OS-assigned port and a `tokio-tungstenite`
//! client exercise the text framing end to end.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;

    use tether_transport::{
        Connection, Incoming, Transport, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a random port and returns a connected (server, client) pair.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server = tokio::spawn(async move {
            let incoming = transport.accept().await.expect("should accept");
            incoming.upgrade().await.expect("should upgrade")
        });

        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("accept task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_send_arrives_as_text_frame() {
        let (conn, mut client) = connected_pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send(r#"{"syncId":"1","data":{}}"#).await.expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "responses must be text frames");
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"syncId":"1","data":{}}"#);
    }

    #[tokio::test]
    async fn test_websocket_recv_accepts_text_and_utf8_binary() {
        let (conn, mut client) = connected_pair().await;

        client.send(Message::Text("first".into())).await.unwrap();
        client.send(Message::Binary(b"second".to_vec().into())).await.unwrap();

        assert_eq!(conn.recv().await.unwrap().as_deref(), Some("first"));
        assert_eq!(conn.recv().await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_websocket_recv_rejects_non_utf8_binary() {
        let (conn, mut client) = connected_pair().await;

        client.send(Message::Binary(vec![0xff, 0xfe].into())).await.unwrap();

        assert!(conn.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (conn, mut client) = connected_pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_accept_returns_before_handshake() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        // A plain TCP client that never sends the upgrade request.
        let idle = tokio::net::TcpStream::connect(addr).await.unwrap();

        let incoming = tokio::time::timeout(Duration::from_secs(2), transport.accept())
            .await
            .expect("accept must not wait for the handshake")
            .expect("should accept");
        assert_eq!(incoming.peer_addr(), idle.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_websocket_upgrade_fails_when_client_leaves() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let idle = tokio::net::TcpStream::connect(addr).await.unwrap();
        let incoming = transport.accept().await.expect("should accept");
        drop(idle);

        assert!(incoming.upgrade().await.is_err());
    }
}
