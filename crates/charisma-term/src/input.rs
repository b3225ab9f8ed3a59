// SPDX-License-Identifier: MIT
//
// Terminal input decoding.
//
// In raw mode every keystroke arrives as raw bytes. This module turns one
// byte into a key event. Printable ASCII is itself; the C0 control range
// (0x01–0x1A) is what the terminal sends for Ctrl+letter — it clears bits
// 5 and 6 of the letter, so Ctrl-Q is 0x11. A few C0 bytes double as named
// keys (Tab, Enter, Escape) and are kept as-is rather than reported as
// Ctrl combinations.
//
// Escape sequences (arrows, function keys) span several bytes and are not
// decoded here; their bytes come through one at a time like any other.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 0b0000_0100;
    }
}

/// A decoded key: the base byte plus modifiers.
///
/// For Ctrl combinations `byte` is the lowercase letter, so Ctrl-Q is
/// `KeyEvent { byte: b'q', modifiers: Modifiers::CTRL }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub byte: u8,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key with no modifiers.
    #[must_use]
    pub const fn plain(byte: u8) -> Self {
        Self {
            byte,
            modifiers: Modifiers::empty(),
        }
    }

    /// Ctrl + `letter`.
    #[must_use]
    pub const fn ctrl(letter: u8) -> Self {
        Self {
            byte: letter.to_ascii_lowercase(),
            modifiers: Modifiers::CTRL,
        }
    }

    /// Decode one raw input byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            TAB | ENTER | LINE_FEED | ESCAPE => Self::plain(byte),
            0x01..=0x1a => Self::ctrl(byte | 0x60),
            _ => Self::plain(byte),
        }
    }

    /// Whether this is `letter` with Ctrl held.
    #[must_use]
    pub fn is_ctrl(self, letter: u8) -> bool {
        self.modifiers == Modifiers::CTRL && self.byte == letter.to_ascii_lowercase()
    }
}

/// The byte a terminal sends for Ctrl + `letter`.
#[must_use]
pub const fn ctrl_key(letter: u8) -> u8 {
    letter & 0x1f
}

const TAB: u8 = b'\t';
const LINE_FEED: u8 = b'\n';
const ENTER: u8 = b'\r';
const ESCAPE: u8 = 0x1b;

// ─── Tests ───────────────────────────────────────────────────────────────────
