//! End-to-end test over a real UDP socket on the loopback interface.
//!
//! A `tokio::net::UdpSocket` bound to `127.0.0.1:0` plays the server.  The
//! client is created with [`rcon_client::connect`], exactly as the binary
//! does, so this exercises address resolution, the socket receive loop, and
//! the session task together.

use std::time::Duration;

use rcon_client::{connect, ConnectionState, RconConfig};
use rcon_core::protocol::packet::{command_payload, login_payload, message_ack_payload};
use rcon_core::{decode_frame, encode_frame};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

async fn recv_payload(server: &UdpSocket) -> (Vec<u8>, std::net::SocketAddr) {
    let mut buf = [0u8; 2048];
    let (len, from) = timeout(STEP_TIMEOUT, server.recv_from(&mut buf))
        .await
        .expect("client datagram must arrive")
        .unwrap();
    let payload = decode_frame(&buf[..len]).expect("client sends valid frames");
    (payload.to_vec(), from)
}

#[tokio::test]
async fn test_login_command_and_message_over_loopback() {
    // Arrange: fake server socket
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    let config = RconConfig::new("127.0.0.1", port, "secret");
    let client = connect(&config).await.expect("connect");
    let mut messages = client.subscribe_messages();

    // Act 1: login
    let login = tokio::spawn(client.login());
    let (payload, client_addr) = recv_payload(&server).await;
    assert_eq!(payload, login_payload("secret"));
    server
        .send_to(&encode_frame(&[0xFF, 0x00, 0x01]), client_addr)
        .await
        .unwrap();

    // Assert 1
    let logged_in = timeout(STEP_TIMEOUT, login).await.unwrap().unwrap();
    assert!(logged_in.unwrap());
    assert_eq!(client.state(), ConnectionState::Connected);

    // Act 2: command round trip
    let response = tokio::spawn(client.send_command("version"));
    let (payload, _) = recv_payload(&server).await;
    assert_eq!(payload, command_payload(0, "version"));
    let mut reply = vec![0xFF, 0x01, 0x00];
    reply.extend_from_slice(b"DayZ 1.25");
    server.send_to(&encode_frame(&reply), client_addr).await.unwrap();

    // Assert 2
    let text = timeout(STEP_TIMEOUT, response).await.unwrap().unwrap();
    assert_eq!(text.unwrap(), "DayZ 1.25");

    // Act 3: server-pushed message
    let mut message = vec![0xFF, 0x02, 0x05];
    message.extend_from_slice(b"RCon admin #0 logged in");
    server.send_to(&encode_frame(&message), client_addr).await.unwrap();

    // Assert 3: acknowledged and forwarded
    let (payload, _) = recv_payload(&server).await;
    assert_eq!(payload, message_ack_payload(5));
    let received = timeout(STEP_TIMEOUT, messages.recv()).await.unwrap();
    assert_eq!(received.as_deref(), Some("RCon admin #0 logged in"));

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
