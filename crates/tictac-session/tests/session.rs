//! Integration tests for the session actor.
//!
//! Timer tests run with `start_paused = true`: Tokio auto-advances the
//! clock whenever every task is idle, so a 5 second reset resolves
//! instantly while `Instant::elapsed` still reports 5 seconds.

use std::time::Duration;

use tictac_protocol::{Codec, JsonCodec, Player};
use tictac_session::{
    Frame, GameState, PlayerSender, RoundStatus, SessionConfig, SessionError,
    SessionHandle, spawn_session,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

const RESET: Duration = Duration::from_secs(5);

fn start() -> SessionHandle {
    spawn_session(SessionConfig::default(), JsonCodec)
}

fn channel() -> (PlayerSender, UnboundedReceiver<Frame>) {
    mpsc::unbounded_channel()
}

fn decode(frame: &Frame) -> GameState {
    JsonCodec.decode(frame).expect("snapshot should decode")
}

/// Waits for the next snapshot. Fails instead of hanging if none comes.
async fn next_state(rx: &mut UnboundedReceiver<Frame>) -> GameState {
    let frame = tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for a snapshot")
        .expect("channel closed");
    decode(&frame)
}

/// Asserts nothing is queued. Call after a `snapshot()` round trip so the
/// actor has processed everything sent before.
fn assert_quiet(rx: &mut UnboundedReceiver<Frame>) {
    assert!(rx.try_recv().is_err(), "unexpected broadcast");
}

/// Two connected players with their join broadcasts drained.
async fn two_players(
    session: &SessionHandle,
) -> (UnboundedReceiver<Frame>, UnboundedReceiver<Frame>) {
    let (tx_x, mut rx_x) = channel();
    let (tx_o, mut rx_o) = channel();
    assert_eq!(session.connect(tx_x).await.unwrap(), Player::X);
    assert_eq!(session.connect(tx_o).await.unwrap(), Player::O);
    next_state(&mut rx_x).await; // X alone
    next_state(&mut rx_x).await; // X and O
    next_state(&mut rx_o).await; // X and O
    (rx_x, rx_o)
}

/// Plays alternating moves starting with X and drains both channels.
/// Returns the last snapshot seen.
async fn play(
    session: &SessionHandle,
    rx_x: &mut UnboundedReceiver<Frame>,
    rx_o: &mut UnboundedReceiver<Frame>,
    moves: &[(usize, usize)],
) -> GameState {
    let mut last = session.snapshot().await.unwrap();
    for &(row, col) in moves {
        let player = last.player_at_turn;
        session.submit_move(player, row, col).await.unwrap();
        last = next_state(rx_x).await;
        assert_eq!(next_state(rx_o).await, last);
    }
    last
}

const X_WINS_TOP_ROW: [(usize, usize); 5] = [(0, 0), (1, 1), (0, 1), (1, 0), (0, 2)];

const DRAW: [(usize, usize); 9] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 1),
    (1, 0),
    (2, 0),
    (1, 2),
    (2, 2),
    (2, 1),
];

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_connect_assigns_x_then_o_then_rejects() {
    let session = start();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    let (tx_c, mut rx_c) = channel();

    assert_eq!(session.connect(tx_a).await, Ok(Player::X));
    let state = next_state(&mut rx_a).await;
    assert_eq!(state.connected_players.len(), 1);

    assert_eq!(session.connect(tx_b).await, Ok(Player::O));
    let seen_by_a = next_state(&mut rx_a).await;
    let seen_by_b = next_state(&mut rx_b).await;
    assert_eq!(seen_by_a, seen_by_b);
    assert!(seen_by_a.connected_players.contains(&Player::X));
    assert!(seen_by_a.connected_players.contains(&Player::O));

    assert_eq!(session.connect(tx_c).await, Err(SessionError::Full));

    session.snapshot().await.unwrap();
    assert_quiet(&mut rx_a);
    assert_quiet(&mut rx_b);
    assert!(rx_c.recv().await.is_none(), "rejected channel is dropped");
}

#[tokio::test]
async fn test_disconnect_frees_the_seat() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    session.disconnect(Player::X).await.unwrap();
    let state = next_state(&mut rx_o).await;
    assert_eq!(state.connected_players.len(), 1);
    assert!(state.connected_players.contains(&Player::O));
    assert!(rx_x.recv().await.is_none(), "X's channel is unbound");

    let (tx, mut rx) = channel();
    assert_eq!(session.connect(tx).await, Ok(Player::X));
    assert_eq!(next_state(&mut rx).await.connected_players.len(), 2);
    assert_eq!(next_state(&mut rx_o).await.connected_players.len(), 2);
}

#[tokio::test]
async fn test_disconnect_unknown_player_is_noop() {
    let session = start();
    let (tx, mut rx) = channel();
    session.connect(tx).await.unwrap();
    next_state(&mut rx).await;

    session.disconnect(Player::O).await.unwrap();
    session.snapshot().await.unwrap();
    assert_quiet(&mut rx);

    let state = session.snapshot().await.unwrap();
    assert_eq!(state.connected_players.len(), 1);
}

#[tokio::test]
async fn test_closed_channel_does_not_block_others() {
    let session = start();
    let (rx_x, mut rx_o) = two_players(&session).await;
    drop(rx_x);

    session.submit_move(Player::X, 1, 1).await.unwrap();
    let state = next_state(&mut rx_o).await;
    assert_eq!(state.field[1][1], Some(Player::X));
}

// =========================================================================
// Moves and turn order
// =========================================================================

#[tokio::test]
async fn test_out_of_turn_move_is_silent() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;
    let before = session.snapshot().await.unwrap();

    session.submit_move(Player::O, 0, 0).await.unwrap();

    assert_eq!(session.snapshot().await.unwrap(), before);
    assert_quiet(&mut rx_x);
    assert_quiet(&mut rx_o);
}

#[tokio::test]
async fn test_repeated_rejected_move_never_mutates() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;
    let after_first = play(&session, &mut rx_x, &mut rx_o, &[(2, 2)]).await;

    for _ in 0..10 {
        // O targets X's cell; X tries to move twice in a row.
        session.submit_move(Player::O, 2, 2).await.unwrap();
        session.submit_move(Player::X, 0, 0).await.unwrap();
        session.submit_move(Player::O, 3, 3).await.unwrap();
    }

    assert_eq!(session.snapshot().await.unwrap(), after_first);
    assert_quiet(&mut rx_x);
    assert_quiet(&mut rx_o);
}

#[tokio::test]
async fn test_turn_alternates_and_cells_persist() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    let moves = [(0, 0), (1, 1), (2, 2), (0, 2)];
    let mut expected = GameState::new()
        .with_player(Player::X)
        .with_player(Player::O);
    for (i, &(row, col)) in moves.iter().enumerate() {
        let mover = if i % 2 == 0 { Player::X } else { Player::O };
        session.submit_move(mover, row, col).await.unwrap();
        let state = next_state(&mut rx_x).await;
        next_state(&mut rx_o).await;

        expected = expected.with_move(mover, row, col).unwrap();
        assert_eq!(state, expected);
        assert_eq!(state.player_at_turn, mover.opponent());
    }
}

#[tokio::test]
async fn test_concurrent_submissions_stay_consistent() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    // Both players hammer every cell from separate tasks.
    let mut tasks = Vec::new();
    for player in Player::ALL {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..3 {
                for row in 0..3 {
                    for col in 0..3 {
                        session.submit_move(player, row, col).await.unwrap();
                        tokio::task::yield_now().await;
                    }
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    let final_state = session.snapshot().await.unwrap();

    // Every broadcast differs from the previous one by exactly one new
    // mark, placed by the player who was at turn.
    let mut prev = GameState::new()
        .with_player(Player::X)
        .with_player(Player::O);
    while let Ok(frame) = rx_x.try_recv() {
        let state = decode(&frame);
        let changed: Vec<_> = (0..3)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .filter(|&(r, c)| prev.field[r][c] != state.field[r][c])
            .collect();
        assert_eq!(changed.len(), 1, "one cell per accepted move");
        let (r, c) = changed[0];
        assert_eq!(prev.field[r][c], None, "occupied cells are never overwritten");
        assert_eq!(state.field[r][c], Some(prev.player_at_turn));
        assert_eq!(state.player_at_turn, prev.player_at_turn.opponent());
        assert_eq!(rx_o.try_recv().map(|f| decode(&f)), Ok(state.clone()));
        prev = state;
    }
    assert_eq!(prev, final_state);
    // X's very first attempt, (0, 0), is always legal.
    assert_eq!(final_state.field[0][0], Some(Player::X));
}

#[tokio::test]
async fn test_concurrent_connects_seat_at_most_two() {
    let session = start();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            let (tx, rx) = channel();
            (session.connect(tx).await, rx)
        }));
    }

    let mut seated = Vec::new();
    let mut receivers = Vec::new();
    for task in tasks {
        let (result, rx) = task.await.unwrap();
        match result {
            Ok(player) => {
                seated.push(player);
                receivers.push(rx);
            }
            Err(e) => assert_eq!(e, SessionError::Full),
        }
    }

    seated.sort();
    assert_eq!(seated, vec![Player::X, Player::O]);

    let state = session.snapshot().await.unwrap();
    assert_eq!(state.connected_players.len(), 2);
    // Both seated players end up seeing the full table.
    for mut rx in receivers {
        let mut last = None;
        while let Ok(frame) = rx.try_recv() {
            last = Some(decode(&frame));
        }
        assert_eq!(last, Some(state.clone()));
    }
}

// =========================================================================
// Round end and reset
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_win_then_reset_after_delay() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    let won = play(&session, &mut rx_x, &mut rx_o, &X_WINS_TOP_ROW).await;
    let won_at = Instant::now();
    assert_eq!(won.winning_player, Some(Player::X));
    assert_eq!(won.status(), RoundStatus::Won(Player::X));

    // Moves after the win are rejected.
    session.submit_move(Player::O, 2, 2).await.unwrap();
    assert_eq!(session.snapshot().await.unwrap(), won);
    assert_quiet(&mut rx_x);

    let reset = next_state(&mut rx_x).await;
    assert_eq!(next_state(&mut rx_o).await, reset);
    assert!(won_at.elapsed() >= RESET);
    assert!(won_at.elapsed() < RESET + Duration::from_secs(1));

    let expected = GameState::new()
        .with_player(Player::X)
        .with_player(Player::O);
    assert_eq!(reset, expected);

    // The new round accepts X's opening move.
    let state = play(&session, &mut rx_x, &mut rx_o, &[(1, 1)]).await;
    assert_eq!(state.field[1][1], Some(Player::X));
}

#[tokio::test(start_paused = true)]
async fn test_middle_row_win() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    let state = play(
        &session,
        &mut rx_x,
        &mut rx_o,
        &[(1, 0), (0, 0), (1, 1), (0, 1), (1, 2)],
    )
    .await;
    assert_eq!(state.winning_player, Some(Player::X));
}

#[tokio::test(start_paused = true)]
async fn test_draw_then_reset() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    let drawn = play(&session, &mut rx_x, &mut rx_o, &DRAW).await;
    let drawn_at = Instant::now();
    assert!(drawn.is_board_full);
    assert_eq!(drawn.winning_player, None);
    assert_eq!(drawn.status(), RoundStatus::Drawn);

    session.submit_move(drawn.player_at_turn, 0, 0).await.unwrap();
    assert_eq!(session.snapshot().await.unwrap(), drawn);

    let reset = next_state(&mut rx_o).await;
    assert!(drawn_at.elapsed() >= RESET);
    assert_eq!(reset, drawn.next_round());
    assert_eq!(reset.player_at_turn, Player::X);
    assert!(!reset.is_board_full);
}

#[tokio::test(start_paused = true)]
async fn test_reset_fires_exactly_once() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;

    // The last move both completes the diagonal and fills the board.
    let state = play(
        &session,
        &mut rx_x,
        &mut rx_o,
        &[
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 0),
            (2, 1),
            (1, 2),
            (1, 1),
            (2, 0),
            (2, 2),
        ],
    )
    .await;
    assert_eq!(state.winning_player, Some(Player::X));
    assert!(state.is_board_full);

    let reset = next_state(&mut rx_x).await;
    assert_eq!(reset.status(), RoundStatus::Ongoing);

    tokio::time::sleep(RESET * 4).await;
    session.snapshot().await.unwrap();
    assert_quiet(&mut rx_x);
    next_state(&mut rx_o).await;
    assert_quiet(&mut rx_o);
}

#[tokio::test(start_paused = true)]
async fn test_connection_churn_does_not_cancel_reset() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;
    play(&session, &mut rx_x, &mut rx_o, &X_WINS_TOP_ROW).await;
    let won_at = Instant::now();

    tokio::time::sleep(Duration::from_secs(2)).await;
    session.disconnect(Player::O).await.unwrap();
    let left = next_state(&mut rx_x).await;
    assert_eq!(left.connected_players.len(), 1);
    assert_eq!(left.winning_player, Some(Player::X));

    let (tx, mut rx_new) = channel();
    assert_eq!(session.connect(tx).await, Ok(Player::O));
    next_state(&mut rx_x).await;
    let joined = next_state(&mut rx_new).await;
    assert_eq!(joined.winning_player, Some(Player::X), "newcomer sees the result");

    let reset = next_state(&mut rx_new).await;
    assert!(won_at.elapsed() >= RESET);
    assert!(won_at.elapsed() < RESET + Duration::from_secs(1));
    assert_eq!(reset.winning_player, None);
    assert_eq!(reset.connected_players.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_reset() {
    let session = start();
    let (mut rx_x, mut rx_o) = two_players(&session).await;
    play(&session, &mut rx_x, &mut rx_o, &X_WINS_TOP_ROW).await;

    session.shutdown().await.unwrap();
    // The actor drops its channels on exit; no reset ever arrives.
    assert!(rx_x.recv().await.is_none());
    assert_eq!(session.snapshot().await, Err(SessionError::Unavailable));
}

#[tokio::test(start_paused = true)]
async fn test_custom_reset_delay() {
    let delay = Duration::from_millis(250);
    let session = spawn_session(
        SessionConfig {
            reset_delay: delay,
            ..SessionConfig::default()
        },
        JsonCodec,
    );
    let (mut rx_x, mut rx_o) = two_players(&session).await;
    play(&session, &mut rx_x, &mut rx_o, &X_WINS_TOP_ROW).await;
    let won_at = Instant::now();

    next_state(&mut rx_x).await;
    assert!(won_at.elapsed() >= delay);
    assert!(won_at.elapsed() < RESET);
}
