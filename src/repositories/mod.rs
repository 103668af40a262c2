pub(crate) mod exams;
pub(crate) mod leaderboard;
pub(crate) mod notes;
pub(crate) mod notifications;
pub(crate) mod questions;
pub(crate) mod results;
pub(crate) mod subjects;
pub(crate) mod users;
