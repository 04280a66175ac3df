//! Bidirectional translation between the Anthropic Messages protocol and
//! the OpenAI Chat Completions protocol.
//!
//! The crate is deliberately transport-free: it knows nothing about HTTP or
//! byte streams. The [`messages`] module holds the wire types of both
//! dialects, [`request`] rewrites an incoming Messages request into a Chat
//! Completions request, [`response`] translates a buffered completion back,
//! and [`stream`] is an incremental translator that turns Chat Completions
//! deltas into the Messages event lifecycle. [`sse`] frames the emitted
//! events for a `text/event-stream` body.
//!
//! Translation never fails: malformed elements are skipped and marshalling
//! is best-effort, so a single bad element can not abort an exchange.

pub mod mapper;
pub mod messages;
pub mod request;
pub mod response;
pub mod sse;
pub mod stream;

pub use mapper::ModelMapper;
pub use request::to_chat_request;
pub use response::to_messages_response;
pub use stream::StreamTranslator;
