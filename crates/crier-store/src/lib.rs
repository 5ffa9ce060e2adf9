pub mod database;
pub mod drafts;
pub mod error;
pub mod recipients;
pub mod schema;

pub use database::Database;
pub use drafts::DraftStore;
pub use error::StoreError;
pub use recipients::RecipientRepo;
