pub mod user;
pub mod exam;
pub mod question;
pub mod assignment;
pub mod submission;
pub mod score;
pub mod wrong_question;
pub mod makeup_exam;
pub mod learning_recommendation;
pub mod notification;
pub mod reminder_log;

pub use user::Entity as User;
pub use exam::Entity as Exam;
pub use question::Entity as Question;
pub use assignment::Entity as Assignment;
pub use submission::Entity as Submission;
pub use score::Entity as Score;
pub use wrong_question::Entity as WrongQuestion;
pub use makeup_exam::Entity as MakeupExam;
pub use learning_recommendation::Entity as LearningRecommendation;
pub use notification::Entity as Notification;
pub use reminder_log::Entity as ReminderLog;
