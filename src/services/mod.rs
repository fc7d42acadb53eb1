//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and the config file
//! - Handling validation and error cases

pub mod access;
pub mod app_config;
pub mod dish;
pub mod tag;

pub use access::{is_ip_allowed, IpNetwork};
pub use app_config::{ConfigStore, ConfigStoreError};
pub use dish::{filter_dishes, DishService, DishServiceError};
pub use tag::{group_tags, TagService, TagServiceError};
