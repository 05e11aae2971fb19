pub mod analysis;
pub mod credential;
pub mod run;
pub mod step;
