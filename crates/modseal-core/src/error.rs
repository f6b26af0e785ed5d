//! Error types for the modseal library

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Key file not found: {} - run 'modseal keygen' first", .0.display())]
    KeyNotFound(PathBuf),

    #[error("Invalid key in {}: {reason}", .path.display())]
    InvalidKey { path: PathBuf, reason: String },

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Modules path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Modules directory is locked by another run (remove {} if stale)", .0.display())]
    Locked(PathBuf),

    #[error("Invalid module identifier: {0:?}")]
    InvalidModuleId(String),

    #[error("No module for {room_id:?} and no default module at {}", .default_path.display())]
    ModuleNotFound {
        room_id: String,
        default_path: PathBuf,
    },

    #[error("Refusing to serve {} module {}", .status, .path.display())]
    UntrustedModule {
        path: PathBuf,
        status: crate::batch::FileStatus,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room already exists: {0}")]
    RoomExists(String),

    #[error("Seat ({row}, {col}) is outside room {room_id}")]
    SeatOutOfRange {
        room_id: String,
        row: usize,
        col: usize,
    },

    #[error("No seat at ({row}, {col}) in room {room_id}")]
    NoSeat {
        room_id: String,
        row: usize,
        col: usize,
    },

    #[error("Hostname {hostname} has no seat in room {room_id}")]
    HostnameNotAssigned { room_id: String, hostname: String },
}
