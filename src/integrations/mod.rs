//! External service integrations.

pub mod services {
    pub use crate::services::*;
}

pub mod persistence {
    pub use crate::persistence::*;
}
