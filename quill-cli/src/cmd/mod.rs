pub mod insert;
pub mod preview;
pub mod run;
pub mod serve;
