pub mod kernel;
pub mod storage;
