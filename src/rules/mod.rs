//! Chess rules capability consumed by the curation pipeline.
//!
//! The pipeline never interprets board positions itself. It asks a
//! [`BoardRules`] implementation to count pieces and to decide whether a
//! starting position is worth keeping. [`StandardRules`] answers with the
//! `shakmaty` rules engine.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

/// Rules-engine predicates over FEN board descriptions.
pub trait BoardRules {
    /// Returns the number of occupied squares, or `None` if the FEN cannot be parsed.
    fn count_pieces(&self, fen: &str) -> Option<u32>;

    /// Returns true if the FEN describes a legal, structurally valid position.
    fn is_board_valid(&self, fen: &str) -> bool;

    /// Returns true if the position is already decided (mate, stalemate,
    /// insufficient material, seventy-five-move rule). Unparseable positions
    /// count as over.
    fn is_game_over(&self, fen: &str) -> bool;

    /// Valid and still playable: the puzzle can actually be attempted.
    fn is_playable(&self, fen: &str) -> bool {
        self.is_board_valid(fen) && !self.is_game_over(fen)
    }
}

/// Halfmove clock at which the seventy-five-move rule ends the game.
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Standard chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    pub fn new() -> Self {
        Self
    }

    fn position(fen: &str) -> Option<Chess> {
        let fen = Fen::from_ascii(fen.trim().as_bytes()).ok()?;
        fen.into_position(CastlingMode::Standard).ok()
    }
}

impl BoardRules for StandardRules {
    fn count_pieces(&self, fen: &str) -> Option<u32> {
        let fen = Fen::from_ascii(fen.trim().as_bytes()).ok()?;
        u32::try_from(fen.as_setup().board.occupied().count()).ok()
    }

    fn is_board_valid(&self, fen: &str) -> bool {
        Self::position(fen).is_some()
    }

    fn is_game_over(&self, fen: &str) -> bool {
        Self::position(fen)
            .is_none_or(|pos| pos.is_game_over() || pos.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES)
    }
}
