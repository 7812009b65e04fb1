// Template registry, layouts and preview rendering.

pub mod handlers;
pub mod layouts;
pub mod registry;
pub mod render;
