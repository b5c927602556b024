use std::sync::Arc;

use chess_rooms::game::{apply_move, Move};
use chess_rooms::models::{
    Board, ClientMessage, Color, Piece, PieceKind, ServerMessage, SessionPhase, UserProfile,
};
use chess_rooms::store::{MemoryStore, SessionStore, StoreError, UserStore};
use chess_rooms::{Coordinator, Outbound};

fn setup() -> (Arc<MemoryStore>, Coordinator) {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(store.clone(), store.clone());
    (store, coordinator)
}

fn join(coordinator: &Coordinator, conn: &str, room: &str) -> Vec<Outbound> {
    coordinator.handle(
        conn,
        ClientMessage::Join {
            room_id: room.to_string(),
            board: Board::initial(),
        },
    )
}

fn assigned_color(out: &[Outbound]) -> Option<Color> {
    out.iter().find_map(|o| match o.message {
        ServerMessage::PlayerColor { color } => Some(color),
        _ => None,
    })
}

fn e4() -> Board {
    apply_move(&Board::initial(), &Move::new(6, 4, 4, 4))
}

#[test]
fn joins_assign_white_then_black_then_room_full() {
    let (store, coordinator) = setup();

    let first = join(&coordinator, "c1", "room");
    assert!(matches!(first[0].message, ServerMessage::LoadChessboard { turn: Color::White, .. }));
    assert_eq!(first[0].recipients, vec!["c1".to_string()]);
    assert_eq!(assigned_color(&first), Some(Color::White));

    let second = join(&coordinator, "c2", "room");
    assert_eq!(assigned_color(&second), Some(Color::Black));
    assert_eq!(coordinator.phase("room"), SessionPhase::Active);

    let third = join(&coordinator, "c3", "room");
    assert_eq!(
        third,
        vec![Outbound::to(
            "c3",
            ServerMessage::RoomFull {
                room_id: "room".to_string(),
                full: true
            }
        )]
    );
    assert_eq!(coordinator.room_of("c3"), None);
    assert_eq!(coordinator.phase("room"), SessionPhase::Active);
    assert_eq!(store.session_count(), 1);
}

#[test]
fn first_joiner_defines_the_starting_board() {
    let (store, coordinator) = setup();
    coordinator.join("c1", "room", e4());
    coordinator.join("c2", "room", Board::initial());

    let session = store.find_by_id("room").unwrap().unwrap();
    assert_eq!(session.board, e4());
}

#[test]
fn relay_reaches_only_the_other_peer() {
    let (_, coordinator) = setup();
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");
    join(&coordinator, "x1", "other");

    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: e4(),
            next_turn: Color::Black,
        },
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].recipients, vec!["c2".to_string()]);
    assert_eq!(
        out[0].message,
        ServerMessage::ReceivePieces {
            board: e4(),
            next_turn: Color::Black
        }
    );
}

#[test]
fn colors_and_board_are_persisted() {
    let (store, coordinator) = setup();
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");

    coordinator.handle(
        "c1",
        ClientMessage::SaveMyColor {
            player_email: "white@example.com".to_string(),
            color: Color::White,
        },
    );
    coordinator.handle(
        "c2",
        ClientMessage::SaveMyColor {
            player_email: "intruder@example.com".to_string(),
            color: Color::White,
        },
    );
    coordinator.handle(
        "c1",
        ClientMessage::SaveChessboard {
            board: e4(),
            next_turn: Color::Black,
            player_email: Some("white@example.com".to_string()),
        },
    );

    let session = store.find_by_id("room").unwrap().unwrap();
    assert_eq!(session.white_player_email.as_deref(), Some("white@example.com"));
    assert_eq!(session.black_player_email, None);
    assert_eq!(session.turn, Color::Black);
    assert_eq!(session.board, e4());

    // Black moves without having saved a color: the backfill claims the slot
    let reply = apply_move(&e4(), &Move::new(1, 4, 3, 4));
    coordinator.handle(
        "c2",
        ClientMessage::SaveChessboard {
            board: reply,
            next_turn: Color::White,
            player_email: Some("black@example.com".to_string()),
        },
    );
    let session = store.find_by_id("room").unwrap().unwrap();
    assert_eq!(
        session.black_player_email.as_deref(),
        Some("black@example.com")
    );
}

#[test]
fn reconnect_resumes_with_stored_identities() {
    let (_, coordinator) = setup();
    join(&coordinator, "c1", "room");
    coordinator.handle(
        "c1",
        ClientMessage::SaveMyColor {
            player_email: "white@example.com".to_string(),
            color: Color::White,
        },
    );
    join(&coordinator, "c2", "room");

    let out = coordinator.handle("c1", ClientMessage::UserLeft);
    assert_eq!(
        out,
        vec![Outbound {
            recipients: vec!["c2".to_string()],
            message: ServerMessage::OpponentLeft,
        }]
    );
    coordinator.disconnect("c1");
    assert_eq!(coordinator.phase("room"), SessionPhase::WaitingForSecond);

    let back = join(&coordinator, "c1b", "room");
    match &back[0].message {
        ServerMessage::LoadChessboard { white_email, .. } => {
            assert_eq!(white_email.as_deref(), Some("white@example.com"))
        }
        other => panic!("expected load-chessboard, got {:?}", other),
    }
    // Second occupant, black slot unclaimed
    assert_eq!(assigned_color(&back), Some(Color::Black));
}

fn rated_room(store: &MemoryStore, coordinator: &Coordinator) {
    store.insert_user(UserProfile::new("white@example.com", "White", "w"));
    store.insert_user(UserProfile::new("black@example.com", "Black", "b"));
    join(coordinator, "c1", "room");
    join(coordinator, "c2", "room");
    coordinator
        .persist_color_assignment("room", "white@example.com", Color::White)
        .unwrap();
    coordinator
        .persist_color_assignment("room", "black@example.com", Color::Black)
        .unwrap();
}

#[test]
fn checkmate_moves_ratings_and_closes_the_room() {
    let (store, coordinator) = setup();
    rated_room(&store, &coordinator);

    let out = coordinator.handle(
        "c2",
        ClientMessage::GameEndCheckmate {
            losing_color: Color::White,
        },
    );
    assert_eq!(out[0].recipients, vec!["c1".to_string()]);
    assert_eq!(
        out[0].message,
        ServerMessage::ReceiveUpdateCheckmate {
            losing_color: Color::White
        }
    );

    let white = store.find_by_email("white@example.com").unwrap().unwrap();
    let black = store.find_by_email("black@example.com").unwrap().unwrap();
    assert_eq!(white.player_rating, 1190);
    assert_eq!(black.player_rating, 1210);
    assert_eq!(store.find_by_id("room").unwrap(), None);
    assert_eq!(coordinator.phase("room"), SessionPhase::Terminal);

    // Second report of the same mate is a no-op
    assert_eq!(coordinator.end_by_checkmate("room", Color::White).unwrap(), false);
    let white = store.find_by_email("white@example.com").unwrap().unwrap();
    assert_eq!(white.player_rating, 1190);
}

#[test]
fn checkmate_without_known_identities_still_deletes() {
    let (store, coordinator) = setup();
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");
    coordinator
        .persist_color_assignment("room", "white@example.com", Color::White)
        .unwrap();

    assert_eq!(coordinator.end_by_checkmate("room", Color::Black).unwrap(), false);
    assert_eq!(store.session_count(), 0);
}

#[test]
fn stalemate_deletes_without_rating_change() {
    let (store, coordinator) = setup();
    rated_room(&store, &coordinator);

    let out = coordinator.handle("c1", ClientMessage::GameEndStalemate);
    assert_eq!(out[0].message, ServerMessage::ReceiveUpdateStalemate);
    assert_eq!(store.session_count(), 0);
    let white = store.find_by_email("white@example.com").unwrap().unwrap();
    assert_eq!(white.player_rating, 1200);

    // Deleting again must not fail
    assert!(coordinator.end_by_stalemate("room").is_ok());
}

#[test]
fn operations_on_missing_sessions_do_not_fail_the_relay() {
    let (store, coordinator) = setup();
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");
    store.delete_by_id("room").unwrap();

    coordinator.handle(
        "c1",
        ClientMessage::SaveChessboard {
            board: e4(),
            next_turn: Color::Black,
            player_email: None,
        },
    );
    assert_eq!(store.session_count(), 0);

    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: e4(),
            next_turn: Color::Black,
        },
    );
    assert_eq!(out.len(), 1);
}

#[test]
fn store_outage_does_not_stop_live_play() {
    let (store, coordinator) = setup();
    store.set_offline(true);

    let first = join(&coordinator, "c1", "room");
    assert!(matches!(first[0].message, ServerMessage::LoadChessboard { .. }));
    join(&coordinator, "c2", "room");

    coordinator.handle(
        "c1",
        ClientMessage::SaveChessboard {
            board: e4(),
            next_turn: Color::Black,
            player_email: None,
        },
    );
    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: e4(),
            next_turn: Color::Black,
        },
    );
    assert_eq!(out[0].recipients, vec!["c2".to_string()]);

    store.set_offline(false);
    let out = coordinator.handle("c1", ClientMessage::GameEndStalemate);
    assert_eq!(out[0].message, ServerMessage::ReceiveUpdateStalemate);
}

#[test]
fn opponent_info_is_relayed() {
    let (_, coordinator) = setup();
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");

    let user = UserProfile::new("white@example.com", "White", "w");
    let out = coordinator.handle(
        "c1",
        ClientMessage::SendOpponentInfo { user: user.clone() },
    );
    assert_eq!(out[0].recipients, vec!["c2".to_string()]);
    assert_eq!(out[0].message, ServerMessage::ReceiveOpponentInfo { user });
}

#[test]
fn verification_drops_illegal_boards() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(store.clone(), store.clone()).with_move_verification(true);
    join(&coordinator, "c1", "room");
    join(&coordinator, "c2", "room");

    // Rook jumping over its own pawn
    let illegal = apply_move(&Board::initial(), &Move::new(7, 0, 4, 0));
    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: illegal.clone(),
            next_turn: Color::Black,
        },
    );
    assert!(out.is_empty());

    coordinator.handle(
        "c1",
        ClientMessage::SaveChessboard {
            board: illegal,
            next_turn: Color::Black,
            player_email: None,
        },
    );
    assert_eq!(store.find_by_id("room").unwrap().unwrap().board, Board::initial());

    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: e4(),
            next_turn: Color::Black,
        },
    );
    assert_eq!(out.len(), 1);
    coordinator.handle(
        "c1",
        ClientMessage::SaveChessboard {
            board: e4(),
            next_turn: Color::Black,
            player_email: None,
        },
    );
    assert_eq!(store.find_by_id("room").unwrap().unwrap().board, e4());

    // Same side moving twice
    let again = apply_move(&e4(), &Move::new(6, 3, 4, 3));
    let out = coordinator.handle(
        "c1",
        ClientMessage::SendPieces {
            board: again,
            next_turn: Color::Black,
        },
    );
    assert!(out.is_empty());
}

#[test]
fn disconnect_unregisters_the_connection() {
    let (_, coordinator) = setup();
    join(&coordinator, "c1", "room");
    coordinator.disconnect("c1");
    assert_eq!(coordinator.room_of("c1"), None);
    assert!(coordinator.handle("c1", ClientMessage::UserLeft).is_empty());
    assert_eq!(coordinator.phase("room"), SessionPhase::Empty);
}

#[test]
fn checkmate_during_store_outage_still_notifies_and_closes() {
    let (store, coordinator) = setup();
    rated_room(&store, &coordinator);
    store.set_offline(true);

    let out = coordinator.handle(
        "c1",
        ClientMessage::GameEndCheckmate {
            losing_color: Color::Black,
        },
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].recipients, vec!["c2".to_string()]);
    assert_eq!(
        out[0].message,
        ServerMessage::ReceiveUpdateCheckmate {
            losing_color: Color::Black
        }
    );
    assert_eq!(coordinator.phase("room"), SessionPhase::Terminal);

    store.set_offline(false);
    let white = store.find_by_email("white@example.com").unwrap().unwrap();
    assert_eq!(white.player_rating, 1200);
}

/// User store whose saves fail for one address
struct RejectingUsers {
    inner: Arc<MemoryStore>,
    rejected: String,
}

impl UserStore for RejectingUsers {
    fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        self.inner.find_by_email(email)
    }

    fn save_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        if user.player_email_id == self.rejected {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        self.inner.save_user(user)
    }
}

#[test]
fn failed_loser_save_leaves_both_ratings_alone() {
    let store = Arc::new(MemoryStore::new());
    let users = Arc::new(RejectingUsers {
        inner: store.clone(),
        rejected: "black@example.com".to_string(),
    });
    let coordinator = Coordinator::new(store.clone(), users);
    rated_room(&store, &coordinator);

    let out = coordinator.handle(
        "c1",
        ClientMessage::GameEndCheckmate {
            losing_color: Color::Black,
        },
    );
    assert_eq!(out[0].recipients, vec!["c2".to_string()]);

    let white = store.find_by_email("white@example.com").unwrap().unwrap();
    let black = store.find_by_email("black@example.com").unwrap().unwrap();
    assert_eq!((white.player_rating, black.player_rating), (1200, 1200));
    assert_eq!(store.session_count(), 0);
}

fn kings_and_rook(white_king: (i8, i8), black_king: (i8, i8), rook: (i8, i8)) -> Board {
    Board::new(vec![
        Piece::new(PieceKind::King, Color::White, white_king.0, white_king.1),
        Piece::new(PieceKind::Rook, Color::White, rook.0, rook.1),
        Piece::new(PieceKind::King, Color::Black, black_king.0, black_king.1),
    ])
}

fn relay(coordinator: &Coordinator, conn: &str, board: Board, next_turn: Color) -> usize {
    coordinator
        .handle(conn, ClientMessage::SendPieces { board, next_turn })
        .len()
}

#[test]
fn verification_keeps_moved_flags_the_client_cleared() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(store.clone(), store.clone()).with_move_verification(true);
    coordinator.join("c1", "room", kings_and_rook((7, 4), (0, 4), (7, 7)));
    coordinator.join("c2", "room", Board::default());

    // Every board below comes from Piece::new, so hasMoved is always false
    let steps = [
        ("c1", kings_and_rook((7, 5), (0, 4), (7, 7)), Color::Black),
        ("c2", kings_and_rook((7, 5), (0, 3), (7, 7)), Color::White),
        ("c1", kings_and_rook((7, 4), (0, 3), (7, 7)), Color::Black),
    ];
    for (conn, board, next_turn) in steps {
        assert_eq!(relay(&coordinator, conn, board, next_turn), 1);
    }
    let back = kings_and_rook((7, 4), (0, 4), (7, 7));
    let out = coordinator.handle(
        "c2",
        ClientMessage::SendPieces {
            board: back.clone(),
            next_turn: Color::White,
        },
    );
    match &out[0].message {
        ServerMessage::ReceivePieces { board, .. } => {
            assert!(board.king(Color::White).map_or(false, |k| k.has_moved));
        }
        other => panic!("expected recieve-pieces, got {:?}", other),
    }

    coordinator.handle(
        "c2",
        ClientMessage::SaveChessboard {
            board: back,
            next_turn: Color::White,
            player_email: None,
        },
    );
    let stored = store.find_by_id("room").unwrap().unwrap();
    assert!(stored.board.king(Color::White).map_or(false, |k| k.has_moved));

    let castled = kings_and_rook((7, 6), (0, 4), (7, 5));
    assert_eq!(relay(&coordinator, "c1", castled, Color::Black), 0);
}

#[test]
fn verification_survives_a_board_with_stray_pieces() {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(store.clone(), store.clone()).with_move_verification(true);

    let mut pieces: Vec<Piece> = Board::initial().iter().cloned().collect();
    pieces.push(Piece::new(PieceKind::Rook, Color::Black, i8::MIN, 0));
    let hostile = Board::new(pieces);
    coordinator.join("c1", "room", hostile.clone());
    coordinator.join("c2", "room", Board::initial());

    let after = apply_move(&hostile, &Move::new(6, 4, 4, 4));
    assert_eq!(relay(&coordinator, "c1", after, Color::Black), 1);
}
