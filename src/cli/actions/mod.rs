use crate::session::{SessionConfig, StoreConfig};

pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        store: StoreConfig,
        session: SessionConfig,
    },
}
