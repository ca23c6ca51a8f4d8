pub mod code;
pub mod issue;
pub mod sweep;
pub mod verify;
