//! Observer connections and subscription fan-out.
//!
//! Each WebSocket observer holds at most one workflow subscription at a
//! time; subscribing again replaces the previous one. Event payloads from
//! the workflow's channel are forwarded verbatim — the relay never parses
//! or rewrites them.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::StreamExt;
use serde::Deserialize;
use weft_core::WorkflowId;
use weft_workflow::event::events_subject;

/// Shared relay state: one NATS connection serves every observer.
#[derive(Clone)]
pub struct RelayState {
    pub client: async_nats::Client,
}

/// A control message from an observer.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObserverCommand {
    /// Start watching a workflow's events.
    Subscribe {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
    },
    /// Stop watching.
    Unsubscribe {
        #[serde(rename = "workflowId")]
        workflow_id: Option<WorkflowId>,
    },
}

/// What one turn of the observer loop produced.
enum Turn {
    /// A frame (or close) from the observer.
    Incoming(Option<Message>),
    /// An event from the subscribed channel, or channel end.
    Event(Option<async_nats::Message>),
}

/// Upgrades an observer connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(move |socket| handle_observer(socket, state))
}

/// Serves one observer until it disconnects.
async fn handle_observer(mut socket: WebSocket, state: RelayState) {
    tracing::info!("observer connected");
    let mut subscription: Option<async_nats::Subscriber> = None;

    loop {
        // Await inside this block so both mutable borrows end before the
        // turn is handled.
        let turn = {
            let next_event = async {
                match subscription.as_mut() {
                    Some(subscriber) => subscriber.next().await,
                    None => futures::future::pending().await,
                }
            };
            tokio::select! {
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(message)) => Turn::Incoming(Some(message)),
                        _ => Turn::Incoming(None),
                    }
                }
                event = next_event => Turn::Event(event),
            }
        };

        match turn {
            Turn::Incoming(None) | Turn::Incoming(Some(Message::Close(_))) => break,
            Turn::Incoming(Some(Message::Text(text))) => {
                match serde_json::from_str::<ObserverCommand>(text.as_str()) {
                    Ok(ObserverCommand::Subscribe { workflow_id }) => {
                        if let Some(mut old) = subscription.take() {
                            let _ = old.unsubscribe().await;
                        }
                        let subject = events_subject(workflow_id);
                        match state.client.subscribe(subject.clone()).await {
                            Ok(subscriber) => {
                                tracing::info!(subject = %subject, "observer subscribed");
                                subscription = Some(subscriber);
                            }
                            Err(error) => {
                                tracing::warn!(error = %error, "subscribe failed");
                            }
                        }
                    }
                    Ok(ObserverCommand::Unsubscribe { .. }) => {
                        if let Some(mut old) = subscription.take() {
                            let _ = old.unsubscribe().await;
                            tracing::info!("observer unsubscribed");
                        }
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "invalid observer message");
                    }
                }
            }
            // Pings are answered by axum; other frames are ignored.
            Turn::Incoming(Some(_)) => {}
            Turn::Event(None) => {
                // Channel closed server-side; drop the subscription.
                subscription = None;
            }
            Turn::Event(Some(event)) => {
                let payload = String::from_utf8_lossy(&event.payload).into_owned();
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(mut subscriber) = subscription.take() {
        let _ = subscriber.unsubscribe().await;
    }
    tracing::info!("observer disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses() {
        let workflow_id = WorkflowId::new();
        let raw = format!(
            r#"{{"type": "subscribe", "workflowId": "{}"}}"#,
            workflow_id.as_ulid()
        );
        let command: ObserverCommand = serde_json::from_str(&raw).unwrap();
        assert_eq!(command, ObserverCommand::Subscribe { workflow_id });
    }

    #[test]
    fn unsubscribe_command_parses_without_id() {
        let command: ObserverCommand =
            serde_json::from_str(r#"{"type": "unsubscribe"}"#).unwrap();
        assert_eq!(
            command,
            ObserverCommand::Unsubscribe { workflow_id: None }
        );
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(serde_json::from_str::<ObserverCommand>(r#"{"type": "replay"}"#).is_err());
    }
}
