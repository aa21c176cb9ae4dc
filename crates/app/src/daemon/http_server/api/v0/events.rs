use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use uuid::Uuid;

use crate::daemon::events::{ServerEvent, Subscription};
use crate::ServiceState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Server-sent events. The first event names this subscriber; after that
/// every published event is forwarded until the client leaves or the
/// server shuts down.
pub async fn handler(
    State(state): State<ServiceState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().to_string();
    tracing::debug!(subscriber = %id, "event stream opened");

    let first = ServerEvent::Registry { id };
    let subscription = state.events().subscribe();

    let events = stream::unfold(
        (Some(first), subscription),
        |(pending, mut subscription): (Option<ServerEvent>, Subscription)| async move {
            let event = match pending {
                Some(event) => event,
                None => subscription.next().await?,
            };
            Some((Ok::<_, Infallible>(to_sse(&event)), (None, subscription)))
        },
    );

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

fn to_sse(event: &ServerEvent) -> Event {
    match Event::default().event(event.event_type()).json_data(event) {
        Ok(sse) => sse,
        Err(e) => {
            tracing::warn!("failed to encode event: {}", e);
            Event::default().comment("unencodable event")
        }
    }
}
