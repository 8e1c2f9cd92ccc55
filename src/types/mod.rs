mod match_state;
mod models;
mod role;

pub use match_state::{MatchAction, MatchState, Party};
pub use models::*;
pub use role::{Actor, Role};
