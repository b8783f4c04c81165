pub mod question;
pub mod result;
pub mod stats;

pub use question::{Category, CreateQuestionRequest, Question, QuestionRecord};
pub use result::{AnswerResult, SaveResultRequest, SaveResultResponse};
pub use stats::{StatsResponse, TopQuestion};
