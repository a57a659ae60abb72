// Domain-layer modules and shared errors/models
pub mod questionnaire {
    pub use crate::form_state::*;
    pub use crate::questionnaire::*;
    pub use crate::step_controller::*;
    pub use crate::summary::*;
    pub use crate::validation::*;
}

pub mod chat {
    pub use crate::chat::*;
    pub use crate::chat_normalizer::*;
    pub use crate::chat_session::*;
    pub use crate::quote_enrichment::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
