pub mod chat;
pub mod user_context;

pub use chat::{ChatErrorResponse, ChatRequest, ChatResponse};
pub use user_context::{EmergencyContact, Medication, UserContext, DEFAULT_WATER_GOAL};
