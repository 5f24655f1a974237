pub mod merge;
pub mod run;
