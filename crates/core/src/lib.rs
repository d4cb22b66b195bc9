pub mod config;
pub mod decode;
pub mod emotion;
pub mod inference;
pub mod music;
pub mod output;
pub mod pipeline;
pub mod playback;
pub mod prompt;
pub mod util;
