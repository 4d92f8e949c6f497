//! Storage contracts and their implementations.

pub mod repository {
    pub use crate::repository::*;
}

pub mod db_storage {
    pub use crate::db_storage::*;
}

pub mod memory_storage {
    pub use crate::memory_storage::*;
}
