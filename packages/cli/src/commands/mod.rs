pub mod edit;
pub mod init;
pub mod show;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};
