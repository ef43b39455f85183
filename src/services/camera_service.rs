use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::{
        observation::ObservationInput,
        ws::{CameraInboundMessage, CameraOutboundMessage},
    },
    error::ServiceError,
    gesture::{Gesture, Observation},
    services::match_service,
    state::{
        CameraConnection, SharedState,
        state_machine::{GamePhase, RoundPhase},
    },
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for frame handling.
#[derive(Debug, Error)]
enum FrameError {
    /// Writer channel closed, the connection should be terminated.
    #[error("connection closed")]
    ConnectionClosed,
    /// Frame rejected or throw refused.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Consecutive frames showing the same gesture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStreak {
    gesture: Option<Gesture>,
    count: u32,
}

impl FrameStreak {
    /// Record the gesture of a new frame and return the length of the current streak.
    ///
    /// Frames without a gesture break the streak and yield 0.
    pub fn observe(&mut self, gesture: Option<Gesture>) -> u32 {
        match gesture {
            None => *self = Self::default(),
            Some(gesture) if self.gesture == Some(gesture) => self.count += 1,
            Some(gesture) => {
                self.gesture = Some(gesture);
                self.count = 1;
            }
        }
        self.count
    }

    /// Forget the current streak.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Handle the full lifecycle for an individual camera WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let camera_id = match CameraInboundMessage::from_json_str(&initial_message) {
        Ok(CameraInboundMessage::Identification { id }) => id,
        Ok(_) => {
            warn!("first message was not identification");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse or validate camera message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    state.cameras().insert(
        camera_id.clone(),
        CameraConnection {
            id: camera_id.clone(),
            tx: outbound_tx.clone(),
        },
    );
    info!(id = %camera_id, "camera connected");

    let ack = CameraOutboundMessage::Ack {
        id: camera_id.clone(),
    };
    if send_message_to_websocket(&outbound_tx, &ack).is_err() {
        info!(id = %camera_id, "connection closed during acknowledgement, terminating");
        disconnect(&state, &camera_id, &outbound_tx);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let mut streak = FrameStreak::default();
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match CameraInboundMessage::from_json_str(&text) {
                Ok(CameraInboundMessage::Frame(input)) => {
                    if let Err(err) =
                        handle_frame(&state, &camera_id, &mut streak, input, &outbound_tx).await
                    {
                        warn!(id = %camera_id, error = %err, "error while handling frame");
                        if matches!(err, FrameError::ConnectionClosed) {
                            break;
                        }
                    }
                }
                Ok(CameraInboundMessage::Identification { .. }) => {
                    warn!(id = %camera_id, "ignoring duplicate identification message");
                }
                Ok(CameraInboundMessage::Unknown) => {
                    debug!(id = %camera_id, "ignoring unknown message type");
                }
                Err(err) => {
                    warn!(id = %camera_id, error = %err, "failed to parse or validate camera message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %camera_id, "camera closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %camera_id, error = %err, "websocket error");
                break;
            }
        }
    }

    disconnect(&state, &camera_id, &outbound_tx);
    info!(id = %camera_id, "camera disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Classify one frame, report it back and throw once the gesture held long enough.
async fn handle_frame(
    state: &SharedState,
    camera_id: &str,
    streak: &mut FrameStreak,
    input: ObservationInput,
    tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), FrameError> {
    let observation = Observation::try_from(input)?;
    let gesture = observation.detect(&state.config().detector).gesture();
    let count = streak.observe(gesture);
    let capturing =
        state.state_machine_phase().await == GamePhase::MatchRunning(RoundPhase::Capturing);

    send_message_to_websocket(
        tx,
        &CameraOutboundMessage::Detection {
            gesture,
            streak: count,
            capturing,
        },
    )?;

    let Some(gesture) = gesture else {
        return Ok(());
    };
    if capturing && count >= state.config().stable_frames {
        info!(id = %camera_id, %gesture, streak = count, "stable gesture, throwing");
        streak.reset();
        match_service::resolve_throw(state, gesture).await?;
    }

    Ok(())
}

/// Push `message` to every connected camera, dropping the ones whose writer is gone.
pub fn broadcast_to_cameras(state: &SharedState, message: &CameraOutboundMessage) {
    let closed: Vec<String> = state
        .cameras()
        .iter()
        .filter(|connection| send_message_to_websocket(&connection.tx, message).is_err())
        .map(|connection| connection.id.clone())
        .collect();

    for id in closed {
        warn!(id = %id, "send failed (writer closed), removing camera connection");
        state.cameras().remove(&id);
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed. Returns
/// `Err(FrameError::ConnectionClosed)` if the writer channel is closed.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), FrameError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| FrameError::ConnectionClosed)
}

/// Remove the registry entry of this connection, leaving a newer one with the same id alone.
fn disconnect(state: &SharedState, camera_id: &str, tx: &mpsc::UnboundedSender<Message>) {
    state
        .cameras()
        .remove_if(camera_id, |_, connection| connection.tx.same_channel(tx));
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[test]
    fn streak_grows_on_repeated_gestures() {
        let mut streak = FrameStreak::default();
        assert_eq!(streak.observe(Some(Gesture::Rock)), 1);
        assert_eq!(streak.observe(Some(Gesture::Rock)), 2);
        assert_eq!(streak.observe(Some(Gesture::Rock)), 3);
    }

    #[test]
    fn streak_restarts_on_another_label() {
        let mut streak = FrameStreak::default();
        streak.observe(Some(Gesture::Rock));
        streak.observe(Some(Gesture::Rock));
        assert_eq!(streak.observe(Some(Gesture::Paper)), 1);
        assert_eq!(streak.observe(None), 0);
        assert_eq!(streak.observe(Some(Gesture::Paper)), 1);
    }

    fn paper_frame() -> ObservationInput {
        ObservationInput {
            hands: Vec::new(),
            fingers: vec![crate::gesture::FingerStates::ALL_UP.into()],
        }
    }

    #[tokio::test]
    async fn auto_throw_fires_only_after_a_stable_streak() {
        let config = AppConfig {
            countdown_secs: 0,
            stable_frames: 3,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        match_service::start_match(&state, Default::default())
            .await
            .unwrap();
        match_service::start_round(&state).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut streak = FrameStreak::default();

        for _ in 0..2 {
            handle_frame(&state, "cam", &mut streak, paper_frame(), &tx)
                .await
                .unwrap();
        }
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Capturing)
        );

        handle_frame(&state, "cam", &mut streak, paper_frame(), &tx)
            .await
            .unwrap();
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Reveal)
        );
        assert_eq!(streak, FrameStreak::default());

        let mut feedback = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
            feedback.push(json["streak"].clone());
        }
        assert_eq!(feedback, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn frames_outside_capture_do_not_throw() {
        let state = AppState::new(AppConfig {
            stable_frames: 1,
            ..AppConfig::default()
        });
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut streak = FrameStreak::default();

        handle_frame(&state, "cam", &mut streak, paper_frame(), &tx)
            .await
            .unwrap();

        assert_eq!(state.state_machine_phase().await, GamePhase::Idle);
        assert!(state.read_current_match(|maybe| maybe.is_none()).await);
    }
}
