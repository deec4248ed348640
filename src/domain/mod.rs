//! Storefront domain: value objects, aggregates and events

pub mod aggregates;
pub mod events;
pub mod value_objects;
