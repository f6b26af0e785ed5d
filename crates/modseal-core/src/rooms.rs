//! Room seating store
//!
//! Tracks the seating grid of every room served by the web front end. The
//! store is an ordinary value owned by the caller and passed to handlers by
//! reference; persistence is an explicit JSON snapshot.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One computer in a room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Display name of the seat
    pub name: String,
    /// Hostname of the machine that claimed the seat
    pub hostname: Option<String>,
    /// Last status reported by that machine
    pub status: Option<String>,
}

impl Seat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: None,
            status: None,
        }
    }

    fn clear(&mut self) {
        self.hostname = None;
        self.status = None;
    }
}

/// Seating grid: rows of cells, `None` where there is no seat (aisles)
pub type RoomLayout = Vec<Vec<Option<Seat>>>;

/// All rooms, keyed by room identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStore {
    pub rooms: HashMap<String, RoomLayout>,
}

impl RoomStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room with every cell seated, seats named `R<row>C<col>` (1-based)
    pub fn create_room(&mut self, room_id: &str, rows: usize, cols: usize) -> Result<()> {
        let layout = (0..rows)
            .map(|r| {
                (0..cols)
                    .map(|c| Some(Seat::new(format!("R{}C{}", r + 1, c + 1))))
                    .collect()
            })
            .collect();
        self.insert_room(room_id, layout)
    }

    /// Add a room with an explicit layout
    pub fn insert_room(&mut self, room_id: &str, layout: RoomLayout) -> Result<()> {
        if self.rooms.contains_key(room_id) {
            return Err(Error::RoomExists(room_id.to_string()));
        }
        self.rooms.insert(room_id.to_string(), layout);
        Ok(())
    }

    /// Current layout of a room
    pub fn layout(&self, room_id: &str) -> Result<&RoomLayout> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| Error::RoomNotFound(room_id.to_string()))
    }

    fn layout_mut(&mut self, room_id: &str) -> Result<&mut RoomLayout> {
        self.rooms
            .get_mut(room_id)
            .ok_or_else(|| Error::RoomNotFound(room_id.to_string()))
    }

    /// Seat `hostname` at (row, col), vacating any seat it held before
    pub fn assign(&mut self, room_id: &str, row: usize, col: usize, hostname: &str) -> Result<()> {
        let layout = self.layout_mut(room_id)?;

        let cell = layout
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or_else(|| Error::SeatOutOfRange {
                room_id: room_id.to_string(),
                row,
                col,
            })?;
        if cell.is_none() {
            return Err(Error::NoSeat {
                room_id: room_id.to_string(),
                row,
                col,
            });
        }

        for seat in layout.iter_mut().flatten().flatten() {
            if seat.hostname.as_deref() == Some(hostname) {
                seat.clear();
            }
        }

        if let Some(Some(seat)) = layout.get_mut(row).and_then(|r| r.get_mut(col)) {
            seat.hostname = Some(hostname.to_string());
            seat.status = None;
        }
        Ok(())
    }

    /// Record a status for the seat held by `hostname`
    pub fn set_status(&mut self, room_id: &str, hostname: &str, status: &str) -> Result<()> {
        let seat = self
            .layout_mut(room_id)?
            .iter_mut()
            .flatten()
            .flatten()
            .find(|seat| seat.hostname.as_deref() == Some(hostname))
            .ok_or_else(|| Error::HostnameNotAssigned {
                room_id: room_id.to_string(),
                hostname: hostname.to_string(),
            })?;
        seat.status = Some(status.to_string());
        Ok(())
    }

    /// Position of the seat held by `hostname`
    pub fn seat_of(&self, room_id: &str, hostname: &str) -> Result<Option<(usize, usize)>> {
        let layout = self.layout(room_id)?;
        for (r, row) in layout.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if matches!(cell, Some(seat) if seat.hostname.as_deref() == Some(hostname)) {
                    return Ok(Some((r, c)));
                }
            }
        }
        Ok(None)
    }

    /// Load a snapshot; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&content)?;
        Ok(store)
    }

    /// Save a snapshot
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        crate::storage::write_atomic(path, content.as_bytes())
    }
}
