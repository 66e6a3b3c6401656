//! Games adapter: PGN files parsed and replayed before generation.
//!
//! The whole file is read and every mainline move is replayed with
//! `shakmaty`, so a single illegal move or broken tag fails the load before
//! the generator sees any game.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use tracing::debug;

use crate::error::SourceError;
use crate::generator::PuzzleGenerator;
use crate::puzzle::CandidatePuzzle;

use super::{LoadMode, PuzzleSource};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// A mainline move together with the position it was played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMove {
    /// 1-based half-move index.
    pub ply: u32,
    /// Move in SAN, as written in the file.
    pub san: String,
    /// Position before the move.
    pub fen_before: String,
}

/// A parsed, replayed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub headers: BTreeMap<String, String>,
    /// Starting position (the `FEN` tag, or the standard start).
    pub start_fen: String,
    pub moves: Vec<GameMove>,
    /// Position after the last mainline move.
    pub final_fen: String,
}

impl Game {
    /// Returns a header value, treating PGN's unknown markers as absent.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !v.chars().all(|c| c == '?' || c == '.'))
    }

    /// Position before the given 1-based ply, or after the last move when
    /// `ply` is one past the end.
    pub fn fen_at(&self, ply: u32) -> Option<&str> {
        let index = usize::try_from(ply).ok()?.checked_sub(1)?;
        match self.moves.get(index) {
            Some(m) => Some(&m.fen_before),
            None if index == self.moves.len() => Some(&self.final_fen),
            None => None,
        }
    }

    /// Human-readable provenance label for a position reached in this game.
    ///
    /// A URL `Site` tag is anchored at the ply (`https://lichess.org/abc#23`).
    /// Otherwise the label is built from players, event and date, skipping
    /// unknown tags.
    pub fn site_label(&self, ply: u32) -> String {
        if let Some(site) = self.header("Site") {
            if site.starts_with("http://") || site.starts_with("https://") {
                return format!("{}#{}", site.trim_end_matches('/'), ply);
            }
        }

        let mut parts = Vec::new();
        match (self.header("White"), self.header("Black")) {
            (Some(white), Some(black)) => parts.push(format!("{} vs {}", white, black)),
            (Some(one), None) | (None, Some(one)) => parts.push(one.to_string()),
            (None, None) => {}
        }

        let occasion: Vec<&str> = [self.header("Event"), self.header("Date")]
            .into_iter()
            .flatten()
            .collect();
        if !occasion.is_empty() {
            parts.push(occasion.join(" "));
        } else if let Some(site) = self.header("Site") {
            parts.push(site.to_string());
        }

        parts.push(format!("ply {}", ply));
        parts.join(", ")
    }

    fn replay(headers: BTreeMap<String, String>, sans: &[String]) -> Result<Game, String> {
        let mut pos = match headers.get("FEN") {
            Some(fen) => Fen::from_ascii(fen.trim().as_bytes())
                .map_err(|e| format!("invalid FEN tag '{}': {}", fen, e))?
                .into_position::<Chess>(CastlingMode::Standard)
                .map_err(|e| format!("illegal FEN tag '{}': {}", fen, e))?,
            None => Chess::default(),
        };
        let start_fen = Fen::from_position(&pos, EnPassantMode::Legal).to_string();

        let mut moves = Vec::with_capacity(sans.len());
        for (index, token) in sans.iter().enumerate() {
            let ply = u32::try_from(index + 1).map_err(|_| "game too long".to_string())?;
            let san_plus = SanPlus::from_ascii(token.as_bytes())
                .map_err(|_| format!("unparseable move '{}' at ply {}", token, ply))?;
            let m = san_plus
                .san
                .to_move(&pos)
                .map_err(|e| format!("illegal move '{}' at ply {}: {}", token, ply, e))?;

            moves.push(GameMove {
                ply,
                san: token.clone(),
                fen_before: Fen::from_position(&pos, EnPassantMode::Legal).to_string(),
            });
            pos.play_unchecked(m);
        }

        Ok(Game {
            headers,
            start_fen,
            moves,
            final_fen: Fen::from_position(&pos, EnPassantMode::Legal).to_string(),
        })
    }
}

/// Raw game text split into tags and mainline SAN tokens.
#[derive(Debug, Default)]
struct RawGame {
    headers: BTreeMap<String, String>,
    sans: Vec<String>,
}

impl RawGame {
    fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.sans.is_empty()
    }
}

/// Splits PGN text into raw games. Comments, NAGs, move numbers and
/// variations are dropped.
fn split_games(text: &str) -> Result<Vec<RawGame>, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut games = Vec::new();
    let mut current = RawGame::default();
    let mut in_movetext = false;
    let mut variation_depth = 0usize;
    let mut chars = text.char_indices().peekable();
    let mut line = 1usize;

    while let Some((start, c)) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '[' if variation_depth == 0 => {
                if in_movetext {
                    games.push(std::mem::take(&mut current));
                    in_movetext = false;
                }
                let mut tag = String::new();
                let mut in_quotes = false;
                let mut escaped = false;
                let mut closed = false;
                for (_, t) in chars.by_ref() {
                    if t == '\n' {
                        line += 1;
                    }
                    if in_quotes {
                        if escaped {
                            escaped = false;
                        } else if t == '\\' {
                            escaped = true;
                        } else if t == '"' {
                            in_quotes = false;
                        }
                    } else if t == '"' {
                        in_quotes = true;
                    } else if t == ']' {
                        closed = true;
                        break;
                    }
                    tag.push(t);
                }
                if !closed {
                    return Err(format!("unterminated tag at line {}", line));
                }
                let (key, value) =
                    parse_tag(&tag).ok_or_else(|| format!("malformed tag '[{}]' at line {}", tag, line))?;
                current.headers.insert(key, value);
            }
            '{' => {
                let mut closed = false;
                for (_, t) in chars.by_ref() {
                    if t == '\n' {
                        line += 1;
                    }
                    if t == '}' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(format!("unterminated comment at line {}", line));
                }
            }
            ';' | '%' => {
                for (_, t) in chars.by_ref() {
                    if t == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '(' => {
                in_movetext = true;
                variation_depth += 1;
            }
            ')' => {
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced ')' at line {}", line))?;
            }
            _ => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, t)) = chars.peek() {
                    if t.is_whitespace() || "[]{}();".contains(t) {
                        break;
                    }
                    end = i + t.len_utf8();
                    chars.next();
                }
                in_movetext = true;
                if variation_depth > 0 {
                    continue;
                }

                let token = &text[start..end];
                if RESULT_TOKENS.contains(&token) {
                    games.push(std::mem::take(&mut current));
                    in_movetext = false;
                    continue;
                }
                if let Some(san) = movetext_san(token) {
                    current.sans.push(san.to_string());
                }
            }
        }
    }

    if variation_depth > 0 {
        return Err("unterminated variation at end of file".to_string());
    }
    if !current.is_empty() {
        games.push(current);
    }

    Ok(games)
}

/// Parses the inside of a `[Key "Value"]` tag.
fn parse_tag(tag: &str) -> Option<(String, String)> {
    let tag = tag.trim();
    let (key, rest) = tag.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    let value = rest.strip_prefix('"')?.strip_suffix('"')?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.replace("\\\"", "\"").replace("\\\\", "\\")))
}

/// Strips move numbers and annotation glyphs from a movetext token.
///
/// Returns `None` for tokens that carry no move (`12.`, `3...`, `$1`, `!?`).
fn movetext_san(token: &str) -> Option<&str> {
    if token.starts_with('$') {
        return None;
    }
    let without_number = token.trim_start_matches(|c: char| c.is_ascii_digit());
    let san = if without_number.len() < token.len() && without_number.starts_with('.') {
        without_number.trim_start_matches('.')
    } else {
        token
    };
    let san = san.trim_end_matches(['!', '?']);
    if san.is_empty() {
        None
    } else {
        Some(san)
    }
}

/// Parses every game in PGN text.
///
/// # Errors
///
/// Returns a description of the first syntax error or illegal move.
pub fn parse_games(text: &str) -> Result<Vec<Game>, String> {
    split_games(text)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            Game::replay(raw.headers, &raw.sans).map_err(|e| format!("game #{}: {}", index + 1, e))
        })
        .collect()
}

/// Reads and replays every game in a PGN file.
///
/// # Errors
///
/// Returns `SourceError::MalformedInput` if any game cannot be parsed or replayed.
pub fn read_games(path: &Path) -> Result<Vec<Game>, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_games(&text).map_err(|reason| SourceError::MalformedInput {
        path: path.to_path_buf(),
        reason,
    })
}

/// Reads all games up front, then runs the generator once per game.
#[derive(Debug, Clone)]
pub struct GamesSource {
    path: PathBuf,
}

impl GamesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PuzzleSource for GamesSource {
    fn mode(&self) -> LoadMode {
        LoadMode::FromGames
    }

    fn load(&self, generator: &dyn PuzzleGenerator) -> Result<Vec<CandidatePuzzle>, SourceError> {
        let games = read_games(&self.path)?;
        debug!(path = %self.path.display(), games = games.len(), "Loaded games");

        let mut puzzles = Vec::new();
        for game in &games {
            for mut puzzle in generator.generate_from_game(game)? {
                if let Some(ply) = puzzle.game_move_number.filter(|&n| n != 0) {
                    if !puzzle.has_site() {
                        puzzle.site = Some(game.site_label(ply));
                    }
                }
                puzzles.push(puzzle);
            }
        }

        Ok(puzzles)
    }
}
