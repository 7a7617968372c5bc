use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// One practice prompt in the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Display string such as "3-5 minutes", not a structured duration.
    pub time_limit: String,
    /// Model answer revealed after a successful upload.
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

/// Form payload of the management view.
///
/// `id` is accepted so the form can echo back the record it was populated
/// from, but it is never trusted: creates get a fresh id and edit-saves keep
/// the id of the editing target.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(default)]
    pub id: Option<u32>,

    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    pub difficulty: Difficulty,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Time limit must be between 1 and 50 characters"
    ))]
    pub time_limit: String,

    #[validate(length(min = 1, message = "Model answer must not be empty"))]
    pub answer: String,
}

impl QuestionDraft {
    pub fn into_question(self, id: u32) -> Question {
        Question {
            id,
            title: self.title,
            description: self.description,
            difficulty: self.difficulty,
            time_limit: self.time_limit,
            answer: self.answer,
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        QuestionDraft {
            id: Some(question.id),
            title: question.title.clone(),
            description: question.description.clone(),
            difficulty: question.difficulty,
            time_limit: question.time_limit.clone(),
            answer: question.answer.clone(),
        }
    }
}

/// The two records every fresh question bank starts with.
pub fn seed_questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            title: "Opening Statement Practice".to_string(),
            description: "Present an opening statement for a mock trial involving a contract \
                          dispute between a small business owner and a supplier. Focus on \
                          establishing credibility and outlining key points."
                .to_string(),
            difficulty: Difficulty::Beginner,
            time_limit: "3-5 minutes".to_string(),
            answer: "A strong opening statement should include:\n\n\
                     1. A compelling hook that grabs attention\n\
                     2. Clear statement of the dispute's nature\n\
                     3. Preview of key evidence\n\
                     4. Establishment of credibility\n\
                     5. Clear request for relief\n\n\
                     Example structure:\n\
                     - Introduction that humanizes your client\n\
                     - Brief overview of the contract terms\n\
                     - Specific instances of breach\n\
                     - Impact on your client's business\n\
                     - Clear statement of damages sought"
                .to_string(),
        },
        Question {
            id: 2,
            title: "Expert Witness Examination".to_string(),
            description: "Conduct a direct examination of a medical expert in a personal \
                          injury case. Focus on establishing credentials and eliciting clear \
                          testimony about causation."
                .to_string(),
            difficulty: Difficulty::Intermediate,
            time_limit: "4-6 minutes".to_string(),
            answer: "Key elements of expert witness examination:\n\n\
                     1. Qualification establishment\n\
                     2. Clear foundation for opinions\n\
                     3. Use of hypotheticals\n\
                     4. Simple language for complex concepts\n\
                     5. Strong conclusion tying evidence to case"
                .to_string(),
        },
    ]
}
