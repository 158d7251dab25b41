pub mod init;
pub mod leaderboard;
pub mod session;
pub mod take;
pub mod validate;
