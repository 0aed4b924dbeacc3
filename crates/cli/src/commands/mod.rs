pub mod doctor;
pub mod init;
pub mod rebuild;
pub mod rules;
pub mod serve;
pub mod validate;
