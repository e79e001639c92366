/// Game state storage and retrieval operations.
pub mod game_store;
/// Store entity and patch definitions.
pub mod models;
/// Storage abstraction layer for backend errors.
pub mod storage;
