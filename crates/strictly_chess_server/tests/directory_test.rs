//! Room directory lifetime tests.

use std::sync::Arc;
use std::time::Duration;
use strictly_chess_server::{
    ClientMessage, DisabledReporter, GuestOnly, RoomDirectory, ServerMessage,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn directory() -> RoomDirectory {
    RoomDirectory::new(Arc::new(GuestOnly), Arc::new(DisabledReporter))
}

async fn next(inbox: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Option<ServerMessage> {
    timeout(Duration::from_secs(2), inbox.recv())
        .await
        .expect("message within timeout")
}

#[tokio::test]
async fn test_same_name_shares_room() {
    let directory = directory();
    let lobby = directory.room("lobby");
    let again = directory.room("lobby");
    let other = directory.room("blitz");

    assert!(lobby.same_room(&again));
    assert!(!lobby.same_room(&other));
    assert_eq!(other.name(), "blitz");
    assert_eq!(directory.len(), 2);
}

#[tokio::test]
async fn test_unused_rooms_are_evicted() {
    let directory = directory();
    for i in 0..100 {
        let room = directory.room(&format!("room-{}", i));
        assert_eq!(room.name(), format!("room-{}", i));
    }
    assert!(directory.is_empty());

    let kept = directory.room("kept");
    directory.room("dropped");
    assert_eq!(directory.len(), 1);
    assert!(kept.same_room(&directory.room("kept")));
}

#[tokio::test]
async fn test_room_stops_after_last_connection_leaves() {
    let directory = directory();
    let room = directory.room("lobby");
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let session_id = room.connect(outbox);
    assert!(matches!(next(&mut inbox).await, Some(ServerMessage::Welcome { .. })));
    room.message(
        &session_id,
        ClientMessage::Join {
            name: Some("Alice".to_string()),
            token: None,
            api_key: None,
        },
    );
    assert!(matches!(next(&mut inbox).await, Some(ServerMessage::Waiting { .. })));

    // Only the connection keeps the room alive; its outbox closes with it.
    drop(room);
    assert!(next(&mut inbox).await.is_none());
    assert!(directory.is_empty());

    // A fresh room has nobody waiting from before.
    let room = directory.room("lobby");
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let session_id = room.connect(outbox);
    assert!(matches!(next(&mut inbox).await, Some(ServerMessage::Welcome { .. })));
    room.message(
        &session_id,
        ClientMessage::Join {
            name: Some("Bob".to_string()),
            token: None,
            api_key: None,
        },
    );
    assert!(matches!(next(&mut inbox).await, Some(ServerMessage::Waiting { .. })));
}
