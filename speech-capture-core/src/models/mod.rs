pub mod audio_models;
pub mod config;
pub mod encoded_audio;
pub mod error;
pub mod requirements;
pub mod state;
