//! Push channel lifecycle: upgrade, register, deliver, unregister.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use extdev_core::{ExtensionProvider, StatusUpdate};
use futures::{Sink, SinkExt, Stream, StreamExt};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::registry::{ConnectionRegistry, NotifyCallback};
use crate::metrics::{WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL, WS_WRITE_FAILURES_TOTAL};
use crate::shutdown::ShutdownCoordinator;

/// Everything a push channel needs from the server.
#[derive(Clone)]
pub struct ChannelContext {
    /// Source of the extension list for the initial update.
    pub provider: Arc<dyn ExtensionProvider>,
    /// Registry the channel joins for its lifetime.
    pub registry: Arc<ConnectionRegistry>,
    /// Shutdown flag and task tracking.
    pub shutdown: Arc<ShutdownCoordinator>,
}

/// Complete the upgrade and hand the socket to [`serve_push_channel`].
///
/// A failed upgrade is only logged; nothing is registered.
pub fn upgrade(ws: WebSocketUpgrade, ctx: ChannelContext) -> Response {
    ws.on_failed_upgrade(|error| debug!(%error, "push channel upgrade failed"))
        .on_upgrade(move |socket| {
            let shutdown = Arc::clone(&ctx.shutdown);
            shutdown.track(serve_push_channel(socket, ctx))
        })
}

/// Run one push channel until the peer leaves or the server closes it.
pub async fn serve_push_channel(socket: WebSocket, ctx: ChannelContext) {
    let (sink, stream) = socket.split();
    run_push_channel(sink, stream, ctx).await;
}

async fn run_push_channel<W, R, E>(sink: W, mut stream: R, ctx: ChannelContext)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let connection = Arc::new(Connection::new());
    let (tx, rx) = mpsc::unbounded_channel::<Arc<StatusUpdate>>();

    // queued before registration so no broadcast can overtake it
    let _ = tx.send(Arc::new(StatusUpdate::connected(ctx.provider.extensions())));

    let delivery = tokio::spawn(deliver(sink, rx, Arc::clone(&connection)));

    let notify: NotifyCallback = Arc::new(move |update| {
        let _ = tx.send(update);
    });
    let _ = ctx.registry.register(Arc::clone(&connection), notify);
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(conn_id = %connection.id(), "push channel opened");

    if ctx.shutdown.is_shutting_down() {
        // registered after the shutdown sweep started
        let _ = ctx.registry.unregister(&connection);
    }

    loop {
        tokio::select! {
            () = connection.closed() => break,
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(frame))) => {
                    debug!(conn_id = %connection.id(), ?frame, "peer closed push channel");
                    break;
                }
                // pings are answered by the protocol layer; client payloads are ignored
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!(conn_id = %connection.id(), %error, "push channel read failed");
                    break;
                }
                None => break,
            },
        }
    }

    let _ = ctx.registry.unregister(&connection);
    if let Err(error) = delivery.await {
        warn!(conn_id = %connection.id(), %error, "delivery task failed");
    }
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    info!(
        conn_id = %connection.id(),
        age_ms = connection.age().as_millis(),
        "push channel closed"
    );
}

/// Write queued updates to the peer, in order, until the queue or the
/// connection closes.
///
/// A forced close wins over the queue: updates still queued at that point
/// are dropped.
async fn deliver<W>(
    mut sink: W,
    mut queue: mpsc::UnboundedReceiver<Arc<StatusUpdate>>,
    connection: Arc<Connection>,
) where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    loop {
        tokio::select! {
            biased;
            () = connection.closed() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: "push channel closed".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
            update = queue.recv() => {
                let Some(update) = update else { break };
                let text = match serde_json::to_string(&*update) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!(kind = %update.kind, %error, "failed to encode status update");
                        continue;
                    }
                };
                if let Err(error) = sink.send(Message::Text(text.into())).await {
                    counter!(WS_WRITE_FAILURES_TOTAL).increment(1);
                    debug!(conn_id = %connection.id(), %error, "push channel write failed");
                    let _ = connection.close();
                    break;
                }
            }
        }
    }
    let _ = sink.close().await;
}
