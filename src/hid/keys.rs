// Copyright 2026 Airtype Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key and media-key definitions.

/// Named non-printable keys (HID Keyboard/Keypad usage page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Backspace,
    Tab,
    Space,
    CapsLock,
    Right,
    Left,
    Down,
    Up,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    Insert,
    PrintScreen,
}

impl KeyCode {
    /// HID usage code for this key.
    pub fn code(self) -> u8 {
        match self {
            KeyCode::Enter => 0x28,
            KeyCode::Escape => 0x29,
            KeyCode::Backspace => 0x2A,
            KeyCode::Tab => 0x2B,
            KeyCode::Space => 0x2C,
            KeyCode::CapsLock => 0x39,
            KeyCode::PrintScreen => 0x46,
            KeyCode::Insert => 0x49,
            KeyCode::Home => 0x4A,
            KeyCode::PageUp => 0x4B,
            KeyCode::Delete => 0x4C,
            KeyCode::End => 0x4D,
            KeyCode::PageDown => 0x4E,
            KeyCode::Right => 0x4F,
            KeyCode::Left => 0x50,
            KeyCode::Down => 0x51,
            KeyCode::Up => 0x52,
        }
    }

    /// Parse a key name as used by the command interface.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Escape,
            "backspace" => KeyCode::Backspace,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Space,
            "capslock" => KeyCode::CapsLock,
            "right" => KeyCode::Right,
            "left" => KeyCode::Left,
            "down" => KeyCode::Down,
            "up" => KeyCode::Up,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "delete" | "del" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            "printscreen" => KeyCode::PrintScreen,
            _ => return None,
        };
        Some(key)
    }
}

/// Media keys (HID Consumer usage page 0x0C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    PlayPause,
    NextTrack,
    PrevTrack,
    Stop,
    VolumeUp,
    VolumeDown,
    Mute,
    BrowserHome,
    BrowserBack,
    BrowserForward,
}

impl MediaKey {
    /// Consumer usage code for this key.
    pub fn usage(self) -> u16 {
        match self {
            MediaKey::PlayPause => 0x00CD,
            MediaKey::NextTrack => 0x00B5,
            MediaKey::PrevTrack => 0x00B6,
            MediaKey::Stop => 0x00B7,
            MediaKey::VolumeUp => 0x00E9,
            MediaKey::VolumeDown => 0x00EA,
            MediaKey::Mute => 0x00E2,
            MediaKey::BrowserHome => 0x0223,
            MediaKey::BrowserBack => 0x0224,
            MediaKey::BrowserForward => 0x0225,
        }
    }

    /// Parse a media key name as used by the command interface.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "playpause" | "play" => MediaKey::PlayPause,
            "next" => MediaKey::NextTrack,
            "prev" | "previous" => MediaKey::PrevTrack,
            "stop" => MediaKey::Stop,
            "volumeup" | "volup" => MediaKey::VolumeUp,
            "volumedown" | "voldown" => MediaKey::VolumeDown,
            "mute" => MediaKey::Mute,
            "home" => MediaKey::BrowserHome,
            "back" => MediaKey::BrowserBack,
            "forward" => MediaKey::BrowserForward,
            _ => return None,
        };
        Some(key)
    }
}

/// Convert a character to a HID keycode.
///
/// Returns `(keycode, needs_shift)`, or `None` for characters the US layout
/// cannot produce.
pub fn char_to_keycode(ch: char) -> Option<(u8, bool)> {
    match ch {
        // Letters (a-z lowercase, A-Z needs shift)
        'a'..='z' => Some((0x04 + (ch as u8 - b'a'), false)),
        'A'..='Z' => Some((0x04 + (ch as u8 - b'A'), true)),
        // Numbers
        '1'..='9' => Some((0x1E + (ch as u8 - b'1'), false)),
        '0' => Some((0x27, false)),
        // Unshifted punctuation
        ' ' => Some((0x2C, false)),
        '-' => Some((0x2D, false)),
        '=' => Some((0x2E, false)),
        '[' => Some((0x2F, false)),
        ']' => Some((0x30, false)),
        '\\' => Some((0x31, false)),
        ';' => Some((0x33, false)),
        '\'' => Some((0x34, false)),
        '`' => Some((0x35, false)),
        ',' => Some((0x36, false)),
        '.' => Some((0x37, false)),
        '/' => Some((0x38, false)),
        '\n' => Some((0x28, false)), // Enter
        '\t' => Some((0x2B, false)), // Tab
        // Shifted punctuation
        '!' => Some((0x1E, true)),
        '@' => Some((0x1F, true)),
        '#' => Some((0x20, true)),
        '$' => Some((0x21, true)),
        '%' => Some((0x22, true)),
        '^' => Some((0x23, true)),
        '&' => Some((0x24, true)),
        '*' => Some((0x25, true)),
        '(' => Some((0x26, true)),
        ')' => Some((0x27, true)),
        '_' => Some((0x2D, true)),
        '+' => Some((0x2E, true)),
        '{' => Some((0x2F, true)),
        '}' => Some((0x30, true)),
        '|' => Some((0x31, true)),
        ':' => Some((0x33, true)),
        '"' => Some((0x34, true)),
        '~' => Some((0x35, true)),
        '<' => Some((0x36, true)),
        '>' => Some((0x37, true)),
        '?' => Some((0x38, true)),
        _ => None,
    }
}
