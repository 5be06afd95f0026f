//! Browser key → native game control translation.
//!
//! The bridged racing game reads single control characters per player
//! from its terminal. The table is fixed; unmapped keys translate to an
//! empty string and are never written to the game.

/// Translate one browser key event into the game's control character.
pub fn translate(player: u8, key: &str) -> &'static str {
    match (player, key) {
        (0, "ArrowUp") => "w",
        (0, "ArrowDown") => "s",
        (0, "ArrowLeft") => "a",
        (0, "ArrowRight") => "d",
        (0, " ") => " ",

        (1, "ArrowUp") => "i",
        (1, "ArrowDown") => "k",
        (1, "ArrowLeft") => "j",
        (1, "ArrowRight") => "l",
        (1, "Enter") => "\r",

        _ => "",
    }
}
