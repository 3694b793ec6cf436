//! Desktop transport backed by tokio-tungstenite.

mod connector;

pub use connector::TungsteniteConnector;
