use crate::state::SchoolState;
use axum::{
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::Stream;
use std::convert::Infallible;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

#[derive(Debug, Copy, Clone)]
pub enum SseEvent {
    CrudStudent,
}

impl SseEvent {
    pub const fn name(self) -> &'static str {
        match self {
            Self::CrudStudent => "crud_student",
        }
    }
}

pub async fn sse_feed(
    State(state): State<SchoolState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe_to_sse_feed()).filter_map(|event| {
        //lagging just means we missed some refreshes, and the next one will catch us up
        event
            .ok()
            .map(|event| Ok(Event::default().event(event.name()).data("")))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
