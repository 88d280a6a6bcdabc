pub mod render;
pub mod state;

pub use state::UiState;
