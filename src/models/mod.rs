pub mod context;
pub mod error;
pub mod event;
pub mod options;
pub mod request;
pub mod response;

pub use context::InvocationContext;
pub use error::AdapterError;
pub use event::{EventKind, GatewayEvent};
pub use options::{AdapterOptions, BinaryPredicate};
pub use request::{CanonicalRequest, FieldValue};
pub use response::{
    BodyStream, CanonicalResponse, GatewayReply, GatewayResponse, HeaderValue, ResponseMeta,
    StreamingResponse,
};
