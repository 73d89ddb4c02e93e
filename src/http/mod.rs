//! HTTP request model consumed by variable getters.
//!
//! # Data Flow
//! ```text
//! http::request::Parts / response HeaderMap
//!     → ingest.rs (request line, headers, host)
//!     → request.rs (Request: typed fields, arena, variable slots)
//!     → headers.rs / list.rs (ordered header records)
//!     → parse.rs (args, cookies, basic auth, sizes)
//!     → builtins read it through `Evaluation`
//! ```
//!
//! # Design Decisions
//! - The server fills `Request` before evaluation; getters never do I/O on the socket
//! - Every value handed out is a `Bytes` view into request or arena memory

pub mod arena;
pub mod headers;
pub mod ingest;
pub mod list;
pub mod parse;
pub mod request;
pub mod server;

pub use arena::Arena;
pub use headers::{Header, HeaderList, HeadersIn, HeadersOut};
pub use list::ChunkedList;
pub use request::{ConnectionInfo, Request, RequestBody, TcpInfo};
pub use server::ServerInfo;
