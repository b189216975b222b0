pub mod init;
pub mod run;
pub mod show;

pub use init::{init, InitArgs};
pub use run::{run, RunArgs};
pub use show::{show, ShowArgs};
