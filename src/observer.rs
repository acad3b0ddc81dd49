//! The observer sink: the external collaborator that receives streaming
//! response metadata and body bytes (spec §6). Rendering, JS, and UI
//! concerns all live on the other side of this trait; this crate never
//! touches them.

/// One tagged attribute update delivered to an [`Observer`].
///
/// Named after the spec's attribute-bag keys; fields carry the same
/// semantics (`Data`/`DataLength` arrive together, `ContentType` is
/// attached once known, etc).
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    NetStatus(NetStatus),
    /// A single raw response header line, forwarded for UI display.
    Header(String),
    /// A chunk of decoded body bytes.
    Data(Vec<u8>),
    ContentLength(i64),
    ContentType(String),
    ServerDate(httpdate::HttpDate),
    LastModified(httpdate::HttpDate),
    Expires(httpdate::HttpDate),
    ETag(String),
    Filename(String),
    Cipher(String),
    SslLibrary(String),
    NotModified,
    MovedTo(String),
    TempMovedTo(String),
    SeeOther(String),
    NoCache,
    MaxAge(u64),
    ClientPull(String),
    /// Body's declared charset is not Latin-1-compatible.
    Foreign(String),
    ContentScriptType(String),
    Error(String),
    Eof,
    Terminate,
    /// A new part has begun in a `multipart/x-mixed-replace` response.
    ServerPush,
    PostNoGood,
}

/// Connection-progress states reported before headers arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetStatus {
    LookingUp,
    Connecting,
    Waiting,
    Uploading,
}

/// The sink a [`FetchRequest`](crate::request::FetchRequest) streams
/// updates to. Implementations typically forward into a rendering task's
/// attribute-update callback; this crate makes no assumption about what's
/// on the other end.
pub trait Observer: Send {
    fn update(&mut self, event: ObserverEvent);
}

/// An [`Observer`] that records every event, for tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<ObserverEvent>,
}

#[cfg(any(test, feature = "test-util"))]
impl Observer for RecordingObserver {
    fn update(&mut self, event: ObserverEvent) {
        self.events.push(event);
    }
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingObserver {
    /// Concatenates every `Data` event's bytes, in order.
    pub fn body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for event in &self.events {
            if let ObserverEvent::Data(bytes) = event {
                out.extend_from_slice(bytes);
            }
        }
        out
    }

    pub fn had_error(&self) -> bool {
        self.events.iter().any(|e| matches!(e, ObserverEvent::Error(_)))
    }

    pub fn had_terminate(&self) -> bool {
        self.events.iter().any(|e| matches!(e, ObserverEvent::Terminate))
    }
}
