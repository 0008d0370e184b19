pub mod m202603010001_create_users;
pub mod m202603010002_create_exams;
pub mod m202603010003_create_questions;
pub mod m202603010004_create_assignments;
pub mod m202603010005_create_submissions;
pub mod m202603010006_create_scores;
pub mod m202603010007_create_wrong_questions;
pub mod m202603010008_create_makeup_exams;
pub mod m202603010009_create_learning_recommendations;
pub mod m202603010010_create_notifications;
pub mod m202603010011_create_reminder_logs;
