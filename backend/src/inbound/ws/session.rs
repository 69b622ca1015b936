//! Per-connection leaderboard socket.
//!
//! Pushes a snapshot frame whenever the subscribed leaderboard stream yields
//! one, pings every 5s, and drops the connection after 10s without client
//! traffic. Client text frames carry no commands and are ignored. Tests
//! shorten both intervals.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use futures_util::StreamExt;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::{Error, LeaderboardEntry, LeaderboardLimit};
use crate::domain::ports::LeaderboardStream;

use super::messages::LeaderboardFrame;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    limit: LeaderboardLimit,
    updates: LeaderboardStream,
    session: Session,
    stream: MessageStream,
) {
    LeaderboardSocket { limit }
        .run(updates, session, stream)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

struct LeaderboardSocket {
    limit: LeaderboardLimit,
}

impl LeaderboardSocket {
    async fn run(
        &self,
        mut updates: LeaderboardStream,
        mut session: Session,
        mut stream: MessageStream,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::heartbeat(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    Self::client_message(&mut session, &mut last_heartbeat, message).await
                }
                update = updates.next() => {
                    self.push_update(&mut session, update).await
                }
            };

            if let Err(error) = result {
                log_shutdown_reason(&error);
                if let Some(reason) = close_reason_for(error) {
                    // The peer may already be gone; nothing left to do if so.
                    let _ = session.close(reason).await;
                }
                return;
            }
        }
    }

    async fn heartbeat(session: &mut Session, last_heartbeat: Instant) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn client_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = message
            .ok_or(SessionError::StreamClosed)?
            .map_err(SessionError::Protocol)?;
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            Message::Text(_)
            | Message::Binary(_)
            | Message::Pong(_)
            | Message::Continuation(_)
            | Message::Nop => Ok(()),
        }
    }

    async fn push_update(
        &self,
        session: &mut Session,
        update: Option<Result<Vec<LeaderboardEntry>, Error>>,
    ) -> Result<(), SessionError> {
        let frame = match update.ok_or(SessionError::FeedClosed)? {
            Ok(entries) => LeaderboardFrame::snapshot(self.limit, entries),
            Err(error) => {
                warn!(code = ?error.code(), %error, "leaderboard refresh failed; keeping socket open");
                LeaderboardFrame::error(&error)
            }
        };
        send_json(session, &frame).await.map_err(SessionError::Network)
    }
}

async fn send_json<T: serde::Serialize>(session: &mut Session, payload: &T) -> Result<(), Closed> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(%error, "failed to serialise leaderboard frame");
            Ok(())
        }
    }
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => warn!("leaderboard socket heartbeat timeout"),
        SessionError::Protocol(error) => warn!(%error, "leaderboard socket protocol error"),
        SessionError::Network(error) => debug!(%error, "leaderboard socket send failed"),
        SessionError::FeedClosed => debug!("leaderboard feed closed; releasing socket"),
        SessionError::ClientClosed(_) | SessionError::StreamClosed => {}
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    let reason = |code, description: &str| {
        Some(Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        }))
    };
    match error {
        SessionError::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
        SessionError::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
        SessionError::FeedClosed => reason(CloseCode::Away, "server shutting down"),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
