pub mod app;
pub mod app_state;
pub mod host_routing;
pub mod service_factory;

pub use app::build_router;
pub use app_state::AppState;
