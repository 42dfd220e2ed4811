//! toolgen HTTP service: turns a text query into a tldraw custom tool and
//! writes it into a frontend project.

use std::sync::Arc;

use toolgen_api_gateway::Generator;
use toolgen_forge::Persister;

pub mod config;
pub mod error;
pub mod routes;

pub use config::{config_path, load_config, ToolgenConfig};
pub use error::{AppError, AppResult};
pub use routes::{build_router, generate_tool, PERSIST_FAILED_HEADER};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn Generator>,
    pub persister: Persister,
}
