use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tracing::{debug, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::transport::message::{ClientFrame, Delivery};
use crate::utils::error::{ConnectError, PublishError, SubscribeError};

/// A live WebSocket connection to the broker.
///
/// Holds the sending side of the per-connection frame channel. The send
/// loop and the read loop run as spawned tasks; when either side of the
/// socket dies, both loops end and the delivery stream terminates. A new
/// connection yields a new stream — streams are never restarted.
#[derive(Debug)]
pub struct WsConnection {
    frames: UnboundedSender<ClientFrame>,
}

impl WsConnection {
    /// Connect to the broker and split the socket into a frame sender and
    /// a delivery stream.
    ///
    /// Inbound text frames that do not parse as a `Delivery` are logged
    /// and skipped; binary and control frames are ignored.
    pub async fn open(url: &str) -> Result<(Self, UnboundedReceiver<Delivery>), ConnectError> {
        let (ws_stream, _) = connect_async(url).await.map_err(|e| ConnectError {
            url: url.to_string(),
            source: e,
        })?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ClientFrame>();
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel::<Delivery>();

        // Outgoing frames: channel -> socket
        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                let text = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("failed to serialize outgoing frame: {e}");
                        continue;
                    }
                };
                if let Err(e) = ws_sender.send(WsMessage::Text(text.into())).await {
                    warn!("websocket send failed: {e}");
                    break;
                }
            }
            debug!("send loop closed");
        });

        // Incoming messages: socket -> delivery stream
        tokio::spawn(async move {
            while let Some(Ok(msg)) = ws_receiver.next().await {
                if !msg.is_text() {
                    continue;
                }
                let text = match msg.to_text() {
                    Ok(t) => t,
                    Err(_) => continue,
                };
                match serde_json::from_str::<Delivery>(text) {
                    Ok(delivery) => {
                        if delivery_tx.send(delivery).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("ignoring unparseable inbound message: {e} | {text}");
                    }
                }
            }
            debug!("read loop closed");
            // delivery_tx drops here, terminating the stream
        });

        Ok((Self { frames: frame_tx }, delivery_rx))
    }

    /// Ask the broker to add this connection to a topic's subscribers.
    pub fn subscribe(&self, topic: &str) -> Result<(), SubscribeError> {
        self.frames
            .send(ClientFrame::Subscribe {
                topic: topic.to_string(),
            })
            .map_err(|_| SubscribeError::ChannelClosed)
    }

    /// Publish a payload to a topic, fire-and-forget.
    ///
    /// Success means the frame was handed to the send loop; there is no
    /// delivery confirmation beyond what the broker provides.
    pub fn publish(&self, topic: &str, payload: String) -> Result<(), PublishError> {
        self.frames
            .send(ClientFrame::Publish {
                topic: topic.to_string(),
                payload,
                timestamp: chrono::Utc::now().timestamp_millis(),
            })
            .map_err(|_| PublishError::ChannelClosed)
    }
}
