use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::{AiState, GameState};
use crate::level::Level;

const MAGIC: &[u8; 4] = b"O2S1";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;
const TRAILER_LEN: usize = 4;

/// Everything needed to resume a duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub level: Level,
    pub player: GameState,
    pub ai: AiState,
    pub extra_lives: u32,
}

impl Snapshot {
    /// Both boards must fit the level and hold a legal tile layout.
    pub fn validate(&self) -> Result<(), GameError> {
        self.level.validate()?;
        for (side, board) in [("player", &self.player), ("ai", &self.ai.board)] {
            if board.grid.size() != self.level.grid_size {
                return Err(GameError::invalid(format!(
                    "{side} grid is {0}x{0}, level {1:?} is {2}x{2}",
                    board.grid.size(),
                    self.level.name,
                    self.level.grid_size
                )));
            }
            board.grid.validate(&self.level.obstacles)?;
            if board.best_score < board.score {
                return Err(GameError::invalid(format!(
                    "{side} best score {} is below current score {}",
                    board.best_score, board.score
                )));
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("bad magic or unsupported version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error(transparent)]
    Invalid(#[from] GameError),
}

/// Encode a snapshot: header, postcard body, CRC32C of everything before it.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
    let body = postcard::to_allocvec(snapshot)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + TRAILER_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

/// Decode and validate a snapshot.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(SnapshotError::Malformed);
    }
    // Checksum first so nothing below reads corrupted fields.
    let (content, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let file_crc = u32::from_le_bytes(trailer.try_into().map_err(|_| SnapshotError::Malformed)?);
    if file_crc != crc32c::crc32c(content) {
        return Err(SnapshotError::Checksum);
    }
    if &content[..MAGIC.len()] != MAGIC || content[MAGIC.len()] != VERSION {
        return Err(SnapshotError::MagicOrVersion);
    }
    let snapshot: Snapshot = postcard::from_bytes(&content[HEADER_LEN..])?;
    snapshot.validate()?;
    Ok(snapshot)
}

pub fn write_to_path<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let bytes = encode(snapshot)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Persona;
    use crate::grid::{Grid, Obstacle};
    use crate::ids::SequentialIds;
    use tempfile::NamedTempFile;

    fn sample() -> Snapshot {
        let level = Level::by_index(1).unwrap();
        let mut ids = SequentialIds::with_prefix("snap");
        let grid = Grid::from_values(
            &[vec![2, 0, 0, 4], vec![0, 0, 0, 0], vec![8, 0, 0, 0], vec![0, 0, 0, 2]],
            &mut ids,
        )
        .unwrap();
        let mut player = GameState::new(grid.clone());
        player.score = 36;
        player.best_score = 120;
        let ai = AiState { board: GameState::new(grid), persona: Persona::Strategic };
        Snapshot { level, player, ai, extra_lives: 2 }
    }

    #[test]
    fn file_round_trip() {
        let snap = sample();
        let tmp = NamedTempFile::new().unwrap();
        write_to_path(tmp.path(), &snap).unwrap();
        let back = read_from_path(tmp.path()).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.ai.persona, Persona::Strategic);
    }

    #[test]
    fn checksum_mismatch() {
        let mut bytes = encode(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(decode(&bytes), Err(SnapshotError::Checksum)));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.truncate(bytes.len() - TRAILER_LEN);
        bytes[0] = b'X';
        let crc = crc32c::crc32c(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SnapshotError::MagicOrVersion)));
    }

    #[test]
    fn short_input_is_malformed() {
        assert!(matches!(decode(&[]), Err(SnapshotError::Malformed)));
        assert!(matches!(decode(b"O2S1"), Err(SnapshotError::Malformed)));
    }

    #[test]
    fn inconsistent_state_is_rejected() {
        let mut snap = sample();
        // A tile now sits on a wall.
        snap.level.obstacles.push(Obstacle::wall("w9", 0, 0));
        let bytes = encode(&snap).unwrap();
        assert!(matches!(decode(&bytes), Err(SnapshotError::Invalid(GameError::InvalidState(_)))));

        let mut snap = sample();
        snap.player.best_score = 1;
        assert!(snap.validate().is_err());
    }
}
