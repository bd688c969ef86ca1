//! Message bus between isolated realms.
//!
//! Realms share no memory. Each one owns an inbox on a shared [`Router`]
//! and exchanges JSON-serialized [`Envelope`]s with the others:
//!
//! - **Registration**: [`Realm::register_handler`] binds a channel name to a
//!   [`Handler`]; requests on that channel are dispatched by method name.
//! - **Invocation**: [`OperationView`] calls a channel's operations, directly
//!   when implemented locally and through the router otherwise.

pub mod envelope;
pub mod handler;
pub mod realm;
pub mod router;
pub mod view;

pub use envelope::{Envelope, Message, Reply, Response};
pub use handler::{arg_str, Handler};
pub use realm::Realm;
pub use router::Router;
pub use view::{resolve, Operation, OperationView, Target};
