pub mod dates;
pub mod error;
pub mod schema;
pub mod state;
pub mod utils;
pub mod validation;

pub use error::ApiError;
pub use state::AppState;
