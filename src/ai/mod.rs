mod assistant;
mod backend;
mod cache;
mod courses;
mod error;
mod gemini;
mod request;
mod types;

pub use assistant::{
    Assistant, AssistantSettings, CHAT_FALLBACK_REPLY, LIVE_NEWS_LIMIT, VISION_FALLBACK_REPLY,
};
pub use backend::ModelBackend;
pub use cache::{get_cache_path, CourseCache};
pub use courses::{
    fallback_courses, suggest_courses, CourseList, CourseSource, COURSE_SUGGESTION_LIMIT,
    FALLBACK_COURSES,
};
pub use error::AiError;
pub use gemini::GeminiClient;
pub use request::{CancelToken, RequestHandle, RequestId, RequestOutcome, RequestSlot};
pub use types::{
    ChatMessage, ChatReply, Content, CutoffEstimate, GenerateRequest, GenerateResponse,
    GroundingSource, InlineImage, Part, Role, UniversityProfile,
};
