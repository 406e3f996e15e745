pub mod transport;

pub use transport::{
    HttpResponse, HttpTransport, InMemoryTransport, SharedBody, TransportError,
};
