// Re-export the Database struct and other public items
pub mod core;
mod note;
mod schema;

pub use self::core::Database;
