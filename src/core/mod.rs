pub mod adapters;
pub mod demand;
pub mod observability;
pub mod openrtb;
pub mod spec;
