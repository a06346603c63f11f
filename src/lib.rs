pub mod audio_io;
pub mod command;
pub mod config;
pub mod controller;
pub mod dsp;
pub mod engine;
pub mod param;
pub mod voice;
