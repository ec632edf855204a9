// Declare model modules
pub mod commit;
pub mod join_request;
pub mod project;
pub mod project_member;
pub mod subscription;
pub mod user;
