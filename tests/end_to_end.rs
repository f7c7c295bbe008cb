//! End-to-end scenarios exercising the HTTP, upgrade, and WebSocket layers
//! together over an in-memory duplex transport.

use protoweb::http::{Headers, HttpSession, Method, Status};
use protoweb::upgrade::{ClientHandshake, ServerHandshake};
use protoweb::ws::{Builder, CloseCode, Incoming, Message, Mode, OpCode};

#[tokio::test]
async fn simple_post_round_trip() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let mut client = HttpSession::new(client_io);
    let mut server = HttpSession::new(server_io);

    let send = async {
        let mut headers = Headers::new();
        headers.append("Host", "example.com");
        client.send_request(Method::Post, "/", &headers, b"Hello !").await.unwrap();
    };
    let recv = async { server.recv_request().await.unwrap() };
    let (_, request) = tokio::join!(send, recv);
    assert_eq!(request.body, b"Hello !");

    let send = async {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "one=1");
        headers.append("Set-Cookie", "two=2");
        server.send_response(Status::OK, &headers, b"OK !").await.unwrap();
    };
    let recv = async { client.recv_response().await.unwrap() };
    let (_, response) = tokio::join!(send, recv);
    assert_eq!(response.status, Status::OK);
    assert_eq!(response.body, b"OK !");
    assert_eq!(
        response.headers.values("set-cookie").collect::<Vec<_>>(),
        vec!["one=1", "two=2"]
    );
}

#[tokio::test]
async fn chunked_request_and_response() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let mut client = HttpSession::new(client_io);
    let mut server = HttpSession::new(server_io);

    let send = async {
        let mut parts = vec![b"Hello ".to_vec(), b"world ".to_vec(), b"!!".to_vec()];
        parts.reverse();
        client
            .send_chunked_request(Method::Post, "/", &Headers::new(), |writer| {
                parts.pop().map(|p| writer.chunk(&p))
            })
            .await
            .unwrap();
    };
    let recv = async { server.recv_request().await.unwrap() };
    let (_, request) = tokio::join!(send, recv);
    assert_eq!(request.body, b"Hello world !!");

    let send = async {
        let mut parts = vec![b"Ola ".to_vec(), b"el ".to_vec(), b"mundo !!".to_vec()];
        parts.reverse();
        server
            .send_chunked_response(Status::OK, &Headers::new(), |writer| {
                parts.pop().map(|p| writer.chunk(&p))
            })
            .await
            .unwrap();
    };
    let recv = async { client.recv_response().await.unwrap() };
    let (_, response) = tokio::join!(send, recv);
    assert_eq!(response.status, Status::OK);
    assert_eq!(response.body, b"Ola el mundo !!");
}

#[tokio::test]
async fn cookie_header_parses_into_a_flat_map() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let mut client = HttpSession::new(client_io);
    let mut server = HttpSession::new(server_io);

    let send = async {
        let mut headers = Headers::new();
        headers.append("Cookie", "one=1; two=2");
        client.send_request(Method::Get, "/", &headers, b"").await.unwrap();
    };
    let recv = async { server.recv_request().await.unwrap() };
    let (_, request) = tokio::join!(send, recv);

    let cookies = request.headers.cookies();
    assert_eq!(cookies.get("one").map(String::as_str), Some("1"));
    assert_eq!(cookies.get("two").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn websocket_upgrade_then_echo_then_clean_close() {
    let (client_io, server_io) = tokio::io::duplex(8192);
    let mut client_http = HttpSession::new(client_io);
    let mut server_http = HttpSession::new(server_io);

    let client_handshake = ClientHandshake::new();
    let send = async {
        let mut headers = client_handshake.request_headers();
        headers.append("Host", "example.com");
        client_http.send_request(Method::Get, "/", &headers, b"").await.unwrap();
    };
    let recv = async { server_http.recv_request().await.unwrap() };
    let (_, request) = tokio::join!(send, recv);

    let server_handshake = ServerHandshake::from_request(&request).unwrap();
    let send = async {
        server_http
            .send_response(Status::SWITCHING_PROTOCOLS, &server_handshake.response_headers(), b"")
            .await
            .unwrap();
    };
    let recv = async { client_http.recv_response().await.unwrap() };
    let (_, response) = tokio::join!(send, recv);
    client_handshake.verify(&response).unwrap();

    let (client_transport, _) = client_http.into_parts();
    let (server_transport, _) = server_http.into_parts();
    let (mut client_tx, mut client_rx) = Builder::new(client_transport, Mode::Client).finish();
    let (mut server_tx, mut server_rx) = Builder::new(server_transport, Mode::Server).finish();

    client_tx.send_text("Hello !").await.unwrap();
    let received = server_rx.receive().await.unwrap();
    assert_eq!(received, Incoming::Message(Message::Text("Hello !".into())));
    server_tx.send_text("OK !").await.unwrap();
    let received = client_rx.receive().await.unwrap();
    assert_eq!(received, Incoming::Message(Message::Text("OK !".into())));

    client_tx.close(CloseCode::NormalClosure, "").await.unwrap();
    let received = server_rx.receive().await.unwrap();
    assert_eq!(
        received,
        Incoming::Closed { code: Some(CloseCode::NormalClosure), reason: "".into() }
    );
    let received = client_rx.receive().await.unwrap();
    assert_eq!(
        received,
        Incoming::Closed { code: Some(CloseCode::NormalClosure), reason: "".into() }
    );
}

#[tokio::test]
async fn websocket_fragmented_send_reassembles_in_order() {
    let (client_io, server_io) = tokio::io::duplex(1 << 16);
    let (mut client_tx, _client_rx) = Builder::new(client_io, Mode::Client).finish();
    let (_server_tx, mut server_rx) = Builder::new(server_io, Mode::Server).finish();

    let chunks: Vec<Vec<u8>> = (0..10u8).map(|seed| vec![seed; 300]).collect();
    let expected: Vec<u8> = chunks.iter().flatten().copied().collect();
    client_tx.send_fragmented(OpCode::Binary, &chunks).await.unwrap();

    let received = server_rx.receive().await.unwrap();
    assert_eq!(received, Incoming::Message(Message::Binary(expected)));
}

#[tokio::test]
async fn ping_is_answered_before_next_message_is_observed() {
    let (client_io, server_io) = tokio::io::duplex(4096);
    let (mut client_tx, _client_rx) = Builder::new(client_io, Mode::Client).finish();
    let (_server_tx, mut server_rx) = Builder::new(server_io, Mode::Server).finish();

    client_tx.send_ping(b"hi").await.unwrap();
    client_tx.send_text("next").await.unwrap();

    let received = server_rx.receive().await.unwrap();
    assert_eq!(received, Incoming::Message(Message::Text("next".into())));
}
