mod server;

pub use server::{ADMIN_TOKEN_FILE, CONFIG_FILE, DB_FILE, FileConfig, ServerConfig};
