mod service;
mod session;
mod view;

pub use crate::error::SessionError;
pub use service::{LessonPlayer, PlayerEvent, PlayerState, Route, Unavailable};
pub use session::{AdvanceOutcome, AnswerState, LessonSession, SubmitOutcome};
pub use view::{CompletionReport, Feedback, OptionHighlight, OptionView, PlayerView, StepView};
