//! Session management APIs.

use crate::rpc::Session;
use powerctl_sdk::rpc::Response;
use powerctl_sdk::Error;

/// Converts the session into a one-way stream of property-change signals.
pub async fn subscribe(mut session: Session) {
    let mut signals = session.app.surface.subscribe();
    if session
        .conn
        .send(&Response::new(Ok::<_, Error>(())))
        .await
        .is_err()
    {
        return;
    }

    loop {
        match signals.recv().await {
            Ok(signal) => {
                if session.conn.send(&signal).await.is_err() {
                    break;
                }
            }
            Err(async_broadcast::RecvError::Overflowed(n)) => {
                tracing::warn!("signal subscriber lagging, {} signals lost", n);
            }
            Err(async_broadcast::RecvError::Closed) => break,
        }
    }
}
