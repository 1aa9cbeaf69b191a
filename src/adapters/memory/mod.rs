pub mod database;

pub use database::Database as InMemoryDatabase;
