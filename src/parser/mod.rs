pub mod canvas_file;
pub mod config;
