use crate::ai::{AiError, Assistant, ChatMessage, ChatReply, InlineImage, ModelBackend};
use crate::scoring::{Calculation, ExamScores};

pub const WELCOME: &str = "Hi there! I'm CampusAI. Ask me anything about Nigerian universities, \
admissions or JAMB, or attach a result slip or admission letter and I'll read it for you.";

pub const CONNECTION_APOLOGY: &str =
    "I'm having trouble connecting to my database. Please try again in a moment.";

const DEFAULT_ATTACHMENT_PROMPT: &str = "Analyze this document for me.";

/// What the student just calculated, passed along with every question asked
/// from the calculator.
#[derive(Debug, Clone)]
pub struct CalculatorContext {
    pub university: Option<String>,
    pub course: Option<String>,
    pub scores: ExamScores,
    pub calculation: Calculation,
    pub cutoff: Option<String>,
}

impl CalculatorContext {
    pub fn greeting(&self) -> String {
        let mut text = format!(
            "Hi! I see your aggregate for {} at {} is {}%.",
            self.course.as_deref().unwrap_or("your course"),
            self.university.as_deref().unwrap_or("this school"),
            self.calculation.composite_display()
        );
        match &self.cutoff {
            Some(cutoff) => text.push_str(&format!(
                " The merit cut-off is {}. How can I help you analyse your chances?",
                cutoff
            )),
            None => text.push_str(" What would you like to know about your chances?"),
        }
        text
    }

    /// The question as sent to the model, prefixed with the calculation.
    pub fn frame(&self, question: &str) -> String {
        let mut lines = vec![
            "Calculation context:".to_string(),
            format!("University: {}", self.university.as_deref().unwrap_or("General")),
            format!("Course: {}", self.course.as_deref().unwrap_or("Not specified")),
            format!("Aggregate score: {}%", self.calculation.composite_display()),
            format!(
                "JAMB: {}, Post-UTME: {}",
                self.scores.entrance_exam, self.scores.secondary_exam
            ),
            format!("Status: {}", self.calculation.band),
        ];
        if let Some(cutoff) = &self.cutoff {
            lines.push(format!("Known merit cut-off: {}", cutoff));
        }
        format!("{}\n\nUser question: {}", lines.join("\n"), question)
    }
}

/// Message shown in the transcript when a general chat turn fails.
pub fn friendly_error(error: &AiError) -> String {
    match error {
        AiError::MissingApiKey => {
            "The Gemini API key is missing. Set CAMPUSAI_API_KEY or GEMINI_API_KEY and try again."
                .to_string()
        }
        AiError::Status { status: 401 | 403, .. } => {
            "Authentication failed. The API key is invalid or expired.".to_string()
        }
        AiError::TimedOut(_) => "That took too long to answer. Please try again.".to_string(),
        AiError::Cancelled => "Request cancelled.".to_string(),
        _ => "Service error. Please check your connection and try again.".to_string(),
    }
}

#[derive(Debug)]
pub enum ChatTurn {
    Replied(ChatReply),
    /// The failure message has already been appended to the transcript.
    Failed { message: String, error: AiError },
    /// Blank input; nothing was sent.
    Ignored,
}

/// A running conversation, optionally anchored to a calculation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    context: Option<CalculatorContext>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::model(WELCOME)],
            context: None,
        }
    }

    pub fn with_context(context: CalculatorContext) -> Self {
        Self {
            transcript: vec![ChatMessage::model(context.greeting())],
            context: Some(context),
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub async fn send<B: ModelBackend>(
        &mut self,
        assistant: &Assistant<B>,
        message: &str,
    ) -> ChatTurn {
        let message = message.trim();
        if message.is_empty() {
            return ChatTurn::Ignored;
        }
        let prompt = match &self.context {
            Some(context) => context.frame(message),
            None => message.to_string(),
        };

        let history = self.transcript.clone();
        self.transcript.push(ChatMessage::user(message));
        let result = assistant.chat(&prompt, &history).await;
        self.record(result)
    }

    /// Send a message with an optional document to the vision model.
    pub async fn send_with_attachment<B: ModelBackend>(
        &mut self,
        assistant: &Assistant<B>,
        message: &str,
        attachment: Option<InlineImage>,
    ) -> ChatTurn {
        let message = match message.trim() {
            "" if attachment.is_some() => DEFAULT_ATTACHMENT_PROMPT,
            "" => return ChatTurn::Ignored,
            m => m,
        };

        let history = self.transcript.clone();
        self.transcript.push(ChatMessage::user(message));
        let result = assistant.analyze(message, attachment, &history).await;
        self.record(result)
    }

    fn record(&mut self, result: Result<ChatReply, AiError>) -> ChatTurn {
        match result {
            Ok(reply) => {
                self.transcript.push(ChatMessage::model(reply.text.clone()));
                ChatTurn::Replied(reply)
            }
            Err(error) => {
                tracing::warn!(error = %error, "chat turn failed");
                let message = if self.context.is_some() {
                    CONNECTION_APOLOGY.to_string()
                } else {
                    friendly_error(&error)
                };
                self.transcript.push(ChatMessage::model(message.clone()));
                ChatTurn::Failed { message, error }
            }
        }
    }
}
