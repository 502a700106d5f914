use crate::domain::GameError;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_connection_id;
use crate::use_cases::{JoinedSession, ServiceError};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, field, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    WriteTimeout,
    ClosedBeforeJoin,
    HandshakeRejected,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

// Failures of an in-session command; the text goes back to the actor only.
#[derive(Debug, thiserror::Error)]
enum ActionError {
    #[error("already joined a lobby")]
    AlreadyJoined,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

struct Handshake {
    joined: JoinedSession,
    created: bool,
    bytes_in: u64,
}

struct ConnCtx {
    conn_id: u64,
    code: String,
    player_id: String,
    // This connection opened the lobby.
    created: bool,
    // Listed in the hub; only then does it count toward keeping the session.
    registered: bool,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_messages: u32,
    last_invalid_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(conn_id: u64, joined: JoinedSession, created: bool, bytes_in: u64) -> Self {
        Self {
            conn_id,
            code: joined.code,
            player_id: joined.player_id,
            created,
            registered: false,
            msgs_in: 1,
            msgs_out: 0,
            bytes_in,
            bytes_out: 0,
            invalid_messages: 0,
            last_invalid_log: Instant::now(),
            close_frame: None,
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Separate connection id for correlating logs before a player exists.
    let conn_id = next_connection_id();
    let span = info_span!(
        "conn",
        conn_id,
        code = field::Empty,
        player_id = field::Empty
    );
    serve_connection(socket, state, conn_id)
        .instrument(span)
        .await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>, conn_id: u64) {
    let write_timeout = state.net.write_timeout;

    let handshake = match timeout(state.net.read_timeout, read_handshake(&mut socket, &state)).await
    {
        Ok(Ok(handshake)) => handshake,
        Ok(Err(NetError::ClosedBeforeJoin)) => {
            info!("client disconnected before handshake");
            return;
        }
        Ok(Err(e)) => {
            info!(error = ?e, "handshake failed");
            return;
        }
        Err(_) => {
            info!("handshake timed out");
            let _ = send_message(
                &mut socket,
                &ServerMessage::error("handshake timeout"),
                write_timeout,
            )
            .await;
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "handshake timeout")
                .await;
            return;
        }
    };

    let mut ctx = ConnCtx::new(
        conn_id,
        handshake.joined,
        handshake.created,
        handshake.bytes_in,
    );
    let span = Span::current();
    span.record("code", ctx.code.as_str());
    span.record("player_id", ctx.player_id.as_str());

    let ack = if ctx.created {
        ServerMessage::LobbyCreated {
            code: ctx.code.clone(),
            player_id: ctx.player_id.clone(),
        }
    } else {
        ServerMessage::LobbyJoined {
            code: ctx.code.clone(),
            player_id: ctx.player_id.clone(),
        }
    };

    // The ack goes out before any state so clients learn their id first.
    if let LoopControl::Disconnect =
        forward_message(&ack, &mut socket, &mut ctx, write_timeout).await
    {
        disconnect_cleanup(&state, &ctx).await;
        return;
    }

    let (outbound_tx, outbound_rx) = mpsc::channel(state.net.outbound_capacity);
    state
        .hub
        .register(&ctx.code, &ctx.player_id, ctx.conn_id, outbound_tx)
        .await;
    ctx.registered = true;
    info!("client connected");
    state.hub.broadcast_state(&state.service, &ctx.code).await;

    run_client_loop(&mut socket, &state, &mut ctx, outbound_rx).await;
    disconnect_cleanup(&state, &ctx).await;
}

async fn read_handshake(socket: &mut WebSocket, state: &AppState) -> Result<Handshake, NetError> {
    let write_timeout = state.net.write_timeout;
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        match incoming? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                let outcome = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::CreateLobby { name }) => state
                        .service
                        .create_session(&name)
                        .await
                        .map(|joined| (joined, true)),
                    Ok(ClientMessage::JoinLobby { code, name }) => state
                        .service
                        .join_session(&normalize_code(&code), &name)
                        .await
                        .map(|joined| (joined, false)),
                    Ok(_) => {
                        reject_handshake(
                            socket,
                            "first message must be create_lobby or join_lobby",
                            write_timeout,
                        )
                        .await;
                        return Err(NetError::HandshakeRejected);
                    }
                    Err(_) => {
                        reject_handshake(socket, "invalid message", write_timeout).await;
                        return Err(NetError::HandshakeRejected);
                    }
                };

                return match outcome {
                    Ok((joined, created)) => Ok(Handshake {
                        joined,
                        created,
                        bytes_in,
                    }),
                    Err(e) => {
                        reject_handshake(socket, &e.to_string(), write_timeout).await;
                        Err(NetError::HandshakeRejected)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::HandshakeRejected);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

async fn reject_handshake(socket: &mut WebSocket, message: &str, write_timeout: Duration) {
    let _ = send_message(socket, &ServerMessage::error(message), write_timeout).await;
    let _ = send_close_with_reason(socket, close_code::POLICY, "handshake failed").await;
}

// Codes are issued uppercase; accept whatever casing the player typed.
fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

async fn run_client_loop(
    socket: &mut WebSocket,
    state: &AppState,
    ctx: &mut ConnCtx,
    mut outbound_rx: mpsc::Receiver<ServerMessage>,
) {
    let read_timeout = state.net.read_timeout;
    let write_timeout = state.net.write_timeout;

    loop {
        let control = tokio::select! {
            incoming = timeout(read_timeout, socket.recv()) => match incoming {
                Ok(incoming) => handle_incoming(incoming, socket, state, ctx).await,
                Err(_) => {
                    info!("read timeout");
                    ctx.close_frame = Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "idle timeout".into(),
                    });
                    LoopControl::Disconnect
                }
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(msg) => forward_message(&msg, socket, ctx, write_timeout).await,
                None => LoopControl::Disconnect,
            },
        };

        if let LoopControl::Disconnect = control {
            break;
        }
    }

    if let Some(frame) = ctx.close_frame.take() {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    let _ = socket.close().await;
}

async fn handle_incoming(
    incoming: Option<Result<Message, axum::Error>>,
    socket: &mut WebSocket,
    state: &AppState,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let write_timeout = state.net.write_timeout;
    match incoming {
        Some(Ok(message)) => match message {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                let msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        ctx.invalid_messages += 1;
                        if should_log(&mut ctx.last_invalid_log) {
                            warn!(
                                error = %e,
                                invalid_messages = ctx.invalid_messages,
                                "invalid client message"
                            );
                        }
                        if ctx.invalid_messages > state.net.max_invalid_messages {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return LoopControl::Disconnect;
                        }
                        let reply = ServerMessage::error("invalid message");
                        return forward_message(&reply, socket, ctx, write_timeout).await;
                    }
                };

                match apply_action(state, ctx, msg).await {
                    Ok(()) => {
                        state.hub.broadcast_state(&state.service, &ctx.code).await;
                        LoopControl::Continue
                    }
                    Err(e) => {
                        debug!(error = %e, "action rejected");
                        let reply = ServerMessage::error(e.to_string());
                        forward_message(&reply, socket, ctx, write_timeout).await
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                LoopControl::Disconnect
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!("websocket closed");
            LoopControl::Disconnect
        }
    }
}

async fn apply_action(
    state: &AppState,
    ctx: &ConnCtx,
    msg: ClientMessage,
) -> Result<(), ActionError> {
    let service = &state.service;
    match msg {
        ClientMessage::CreateLobby { .. } | ClientMessage::JoinLobby { .. } => {
            return Err(ActionError::AlreadyJoined);
        }
        ClientMessage::StartGame => service.start_game(&ctx.code).await?,
        ClientMessage::PlayCard {
            hand_index,
            target_id,
        } => {
            let hand_index = usize::try_from(hand_index)
                .map_err(|_| ServiceError::Game(GameError::InvalidHandIndex))?;
            match target_id.filter(|target| !target.is_empty()) {
                Some(target_id) => {
                    service
                        .play_accusation(&ctx.code, &ctx.player_id, hand_index, &target_id)
                        .await?
                }
                None => {
                    service
                        .play_score(&ctx.code, &ctx.player_id, hand_index)
                        .await?
                }
            }
        }
        ClientMessage::CallOver => service.call_over(&ctx.code, &ctx.player_id).await?,
    }
    Ok(())
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn send_message(
    socket: &mut WebSocket,
    msg: &ServerMessage,
    write_timeout: Duration,
) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    timeout(write_timeout, socket.send(Message::Text(txt.into())))
        .await
        .map_err(|_| NetError::WriteTimeout)??;
    Ok(bytes)
}

async fn forward_message(
    msg: &ServerMessage,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    write_timeout: Duration,
) -> LoopControl {
    match send_message(socket, msg, write_timeout).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await?;
    socket.close().await.map_err(NetError::Ws)
}

async fn disconnect_cleanup(state: &AppState, ctx: &ConnCtx) {
    let remaining = if ctx.registered {
        state
            .hub
            .unregister(&ctx.code, &ctx.player_id, ctx.conn_id)
            .await
    } else {
        state.hub.connection_count(&ctx.code).await
    };

    // Sessions cannot be resumed: the last registered socket out closes the
    // session. A creator that never registered was its only member.
    if remaining == 0 && (ctx.registered || ctx.created) {
        state.service.close_session(&ctx.code).await;
    }

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_messages = ctx.invalid_messages,
        registered = ctx.registered,
        "connection stats"
    );
    info!(remaining, "client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::net::ConnectionHub;
    use crate::interface_adapters::state::NetSettings;
    use crate::use_cases::test_support::{RecordingDirectory, SequentialIds};
    use crate::use_cases::{SessionService, SessionSettings};

    fn build_test_state() -> AppState {
        let service = SessionService::new(
            Arc::new(RecordingDirectory::new()),
            Arc::new(SequentialIds::default()),
            SessionSettings::default(),
        );
        AppState {
            service: Arc::new(service),
            hub: Arc::new(ConnectionHub::new()),
            net: NetSettings {
                read_timeout: Duration::from_secs(5),
                write_timeout: Duration::from_secs(5),
                outbound_capacity: 8,
                max_invalid_messages: 10,
            },
        }
    }

    async fn register(state: &AppState, ctx: &mut ConnCtx) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(8);
        state
            .hub
            .register(&ctx.code, &ctx.player_id, ctx.conn_id, tx)
            .await;
        ctx.registered = true;
        rx
    }

    #[tokio::test]
    async fn when_joiner_drops_before_registering_then_session_survives() {
        let state = build_test_state();
        let host = state.service.create_session("Ada").await.expect("create");
        let guest = state
            .service
            .join_session(&host.code, "Bo")
            .await
            .expect("join");
        // The host has finished its handshake but is not in the hub yet.
        let guest_ctx = ConnCtx::new(2, guest, false, 0);

        disconnect_cleanup(&state, &guest_ctx).await;

        assert_eq!(state.service.session_count().await, 1);
        assert!(
            state
                .service
                .view_for(&host.code, &host.player_id)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn when_creator_drops_before_registering_then_session_is_closed() {
        let state = build_test_state();
        let host = state.service.create_session("Ada").await.expect("create");
        let host_ctx = ConnCtx::new(1, host, true, 0);

        disconnect_cleanup(&state, &host_ctx).await;

        assert_eq!(state.service.session_count().await, 0);
    }

    #[tokio::test]
    async fn when_registered_player_leaves_then_session_closes_only_with_the_last() {
        let state = build_test_state();
        let host = state.service.create_session("Ada").await.expect("create");
        let guest = state
            .service
            .join_session(&host.code, "Bo")
            .await
            .expect("join");
        let mut host_ctx = ConnCtx::new(1, host, true, 0);
        let mut guest_ctx = ConnCtx::new(2, guest, false, 0);
        let _host_rx = register(&state, &mut host_ctx).await;
        let _guest_rx = register(&state, &mut guest_ctx).await;

        disconnect_cleanup(&state, &host_ctx).await;
        assert_eq!(state.service.session_count().await, 1);

        disconnect_cleanup(&state, &guest_ctx).await;
        assert_eq!(state.service.session_count().await, 0);
    }

    #[test]
    fn when_code_is_typed_loosely_then_it_is_normalized() {
        assert_eq!(normalize_code("  abcd2345 "), "ABCD2345");
    }

    #[test]
    fn when_service_error_is_wrapped_then_message_is_unchanged() {
        let err = ActionError::from(ServiceError::Game(GameError::NotPlayersTurn));
        assert_eq!(err.to_string(), GameError::NotPlayersTurn.to_string());
    }

    #[test]
    fn when_logged_recently_then_should_log_is_throttled() {
        let mut last = Instant::now();
        assert!(!should_log(&mut last));

        let mut stale = Instant::now() - LOG_THROTTLE;
        assert!(should_log(&mut stale));
        assert!(!should_log(&mut stale));
    }
}
