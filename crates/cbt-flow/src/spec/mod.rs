pub mod legacy;
pub mod question;
pub mod template;

pub use question::{Branch, ChoiceOption, Question, QuestionKind, ScaleRange};
pub use template::Template;
