//! End-to-end replication over loopback TCP.

use std::time::Duration;
use strictly_replica::replication::{
    encode, ClientMessage, ReplicaClient, ReplicaServer, ServerMessage, MAX_FRAME_LEN,
};
use strictly_replica::{GameSession, Outcome, Player, Position, SessionPhase, Square};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> (String, JoinHandle<()>) {
    let session = GameSession::new("loopback".to_string());
    let server = ReplicaServer::bind("127.0.0.1:0", session)
        .await
        .expect("bind loopback");
    let addr = server.local_addr().expect("bound address").to_string();
    let handle = tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, handle)
}

async fn next(client: &mut ReplicaClient) -> ServerMessage {
    timeout(WAIT, client.next_message())
        .await
        .expect("frame before timeout")
        .expect("readable frame")
        .expect("connection open")
}

async fn connect_pair(addr: &str) -> (ReplicaClient, ReplicaClient) {
    let mut a = ReplicaClient::connect(addr).await.expect("first connection");
    let mut b = ReplicaClient::connect(addr).await.expect("second connection");
    assert_eq!(a.seat(), Some(Player::A));
    assert_eq!(b.seat(), Some(Player::B));
    assert_eq!(next(&mut a).await, ServerMessage::GameStarted);
    assert_eq!(next(&mut b).await, ServerMessage::GameStarted);
    (a, b)
}

fn board_changed(player: Player, row: usize, col: usize) -> ServerMessage {
    ServerMessage::BoardChanged {
        row,
        col,
        square: Square::Occupied(player),
    }
}

#[tokio::test]
async fn test_move_replicates_to_both_mirrors() {
    let (addr, server) = start_server().await;
    let (mut a, mut b) = connect_pair(&addr).await;

    a.propose(1, 1).await.unwrap();
    for client in [&mut a, &mut b] {
        assert_eq!(next(client).await, board_changed(Player::A, 1, 1));
        assert_eq!(
            next(client).await,
            ServerMessage::TurnChanged { player: Player::B }
        );
        assert_eq!(
            client.mirror().board().get(Position::CENTER),
            Square::Occupied(Player::A)
        );
        assert_eq!(client.mirror().turn(), Some(Player::B));
    }
    assert!(b.mirror().can_propose(Position::TOP_LEFT));
    assert!(!a.mirror().can_propose(Position::TOP_LEFT));

    server.abort();
}

#[tokio::test]
async fn test_rejected_proposals_produce_no_frames() {
    let (addr, server) = start_server().await;
    let (mut a, mut b) = connect_pair(&addr).await;

    // Out of turn, then impersonating A, then a legal move by A.
    b.propose(0, 0).await.unwrap();
    b.propose_as(Player::A, 0, 0).await.unwrap();
    a.propose(2, 2).await.unwrap();

    // Had either of B's proposals landed, A would see (0, 0) first.
    assert_eq!(next(&mut a).await, board_changed(Player::A, 2, 2));
    assert_eq!(next(&mut b).await, board_changed(Player::A, 2, 2));

    server.abort();
}

#[tokio::test]
async fn test_redelivered_frame_applied_once() {
    let (addr, server) = start_server().await;
    let (mut a, mut b) = connect_pair(&addr).await;

    let frame = ClientMessage::Propose {
        seq: 1,
        player: Player::A,
        row: 0,
        col: 0,
    };
    a.send(&frame).await.unwrap();
    assert_eq!(next(&mut b).await, board_changed(Player::A, 0, 0));
    assert_eq!(
        next(&mut b).await,
        ServerMessage::TurnChanged { player: Player::B }
    );

    b.propose(1, 1).await.unwrap();
    assert_eq!(next(&mut b).await, board_changed(Player::B, 1, 1));
    assert_eq!(
        next(&mut b).await,
        ServerMessage::TurnChanged { player: Player::A }
    );

    // Same frame again, now on A's turn: must be ignored.
    a.send(&frame).await.unwrap();
    let fresh = ClientMessage::Propose {
        seq: 2,
        player: Player::A,
        row: 2,
        col: 2,
    };
    a.send(&fresh).await.unwrap();
    assert_eq!(next(&mut b).await, board_changed(Player::A, 2, 2));

    server.abort();
}

#[tokio::test]
async fn test_third_connection_refused() {
    let (addr, server) = start_server().await;
    let (_a, _b) = connect_pair(&addr).await;

    let refused = ReplicaClient::connect(&addr).await;
    assert!(refused.is_err());

    server.abort();
}

#[tokio::test]
async fn test_refused_socket_is_closed() {
    let (addr, server) = start_server().await;
    let (_a, _b) = connect_pair(&addr).await;

    let (read_half, mut write_half) = TcpStream::connect(&addr).await.unwrap().into_split();
    let mut lines = BufReader::new(read_half).lines();
    let refusal = timeout(WAIT, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(refusal.as_deref(), Some("{\"type\":\"session_full\"}"));
    assert_eq!(timeout(WAIT, lines.next_line()).await.unwrap().unwrap(), None);

    // With the server side fully closed, writes start failing.
    let frame = encode(&ClientMessage::Propose {
        seq: 1,
        player: Player::A,
        row: 0,
        col: 0,
    })
    .unwrap();
    let mut write_failed = false;
    for _ in 0..40 {
        if write_half.write_all(frame.as_bytes()).await.is_err() {
            write_failed = true;
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(write_failed, "refused socket still accepting writes");

    server.abort();
}

#[tokio::test]
async fn test_oversized_frame_drops_connection() {
    let (addr, server) = start_server().await;

    let (read_half, mut write_half) = TcpStream::connect(&addr).await.unwrap().into_split();
    let mut lines = BufReader::new(read_half).lines();
    let welcome = timeout(WAIT, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(
        welcome.as_deref(),
        Some("{\"type\":\"welcome\",\"seat\":\"a\"}")
    );

    // One byte past the limit, so the server consumes everything it was sent.
    let flood = vec![b'x'; MAX_FRAME_LEN + 1];
    write_half.write_all(&flood).await.unwrap();
    assert_eq!(timeout(WAIT, lines.next_line()).await.unwrap().unwrap(), None);

    // The seat was freed before the game started.
    let next = ReplicaClient::connect(&addr).await.unwrap();
    assert_eq!(next.seat(), Some(Player::A));

    server.abort();
}

#[tokio::test]
async fn test_full_game_ends_on_every_mirror() {
    let (addr, server) = start_server().await;
    let (mut a, mut b) = connect_pair(&addr).await;

    let script = [
        (Player::A, 0, 0),
        (Player::B, 1, 1),
        (Player::A, 0, 1),
        (Player::B, 2, 2),
    ];
    for (player, row, col) in script {
        match player {
            Player::A => a.propose(row, col).await.unwrap(),
            Player::B => b.propose(row, col).await.unwrap(),
        };
        for client in [&mut a, &mut b] {
            assert_eq!(next(client).await, board_changed(player, row, col));
            assert_eq!(
                next(client).await,
                ServerMessage::TurnChanged {
                    player: player.opponent()
                }
            );
        }
    }

    a.propose(0, 2).await.unwrap();
    for client in [&mut a, &mut b] {
        assert_eq!(next(client).await, board_changed(Player::A, 0, 2));
        assert_eq!(
            next(client).await,
            ServerMessage::GameEnded {
                outcome: Outcome::Won(Player::A)
            }
        );
        assert_eq!(client.mirror().phase(), SessionPhase::Finished);
        assert_eq!(client.mirror().outcome(), Outcome::Won(Player::A));
    }

    // Sixth move after the end is rejected silently.
    b.propose(2, 0).await.unwrap();
    let quiet = timeout(Duration::from_millis(200), a.next_message()).await;
    assert!(quiet.is_err(), "no frame expected after game end");

    server.abort();
}
