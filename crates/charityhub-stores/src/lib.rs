pub mod attachments;
pub mod countries;
pub mod store;

#[cfg(test)]
mod testing;

pub use attachments::Attachments;
pub use store::{EntityStore, StoreError};
