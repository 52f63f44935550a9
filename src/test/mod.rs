pub mod utils;

mod setting;
