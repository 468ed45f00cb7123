pub mod routes;
pub mod server;

pub use routes::setup_routes;
pub use server::start_server;
