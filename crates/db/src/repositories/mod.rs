//! Repository abstractions for data access.

mod system_data;

pub use system_data::SystemDataRepository;
