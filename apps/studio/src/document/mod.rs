// Document model, hydration from backend records, and the field synchronizer.

pub mod hydrate;
pub mod model;
pub mod sync;
