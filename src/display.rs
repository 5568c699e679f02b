use serde::{Deserialize, Serialize};

use crate::memory::MemorySystem;

pub const WIDTH_CHARS: usize = 32;
pub const HEIGHT_CHARS: usize = 24;
pub const SCREEN_WIDTH: usize = WIDTH_CHARS * 8;
pub const SCREEN_HEIGHT: usize = HEIGHT_CHARS * 8;

pub const FONT_ROM_START: u16 = 0xE000;
pub const USER_CHAR_START: u16 = 0xC000;
pub const USER_CHAR_LENGTH: u32 = 0x0100;
pub const VIDEO_RAM_START: u16 = 0xC100;
pub const VIDEO_RAM_LENGTH: u32 = 0x0300;

const FOREGROUND: u8 = 1;
const BACKGROUND: u8 = 0;

/// Character plane selected by PB5.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Font {
    #[default]
    Normal,
    UserDefined,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub font: Font,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_font(&mut self, font: Font) {
        if self.font != font {
            tracing::trace!("[DISPLAY] font {:?}", font);
        }
        self.font = font;
    }
}

/// Draws the 32x24 character screen straight from the address space.
///
/// Codes 0x00-0x7F come from the character generator at the start of the
/// BASIC ROM. Codes 0x80-0xFF are the same glyphs inverted with the normal
/// font, or glyphs from user-defined character RAM with the user font.
pub struct Renderer<'a> {
    memory: &'a MemorySystem,
    font: Font,
    pub screen_buffer: Vec<u8>,
}

impl<'a> Renderer<'a> {
    pub fn new(memory: &'a MemorySystem, font: Font) -> Self {
        Self {
            memory,
            font,
            screen_buffer: vec![BACKGROUND; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn as_text(&self) -> String {
        let mut text = String::new();
        for row in 0..HEIGHT_CHARS {
            for column in 0..WIDTH_CHARS {
                let code = self.code_at(column, row) & 0x7F;
                let c = code as char;
                text.push(if c.is_ascii_graphic() { c } else { ' ' });
            }
            text.push('\n');
        }
        text
    }

    fn code_at(&self, column: usize, row: usize) -> u8 {
        let offset = (row * WIDTH_CHARS + column) as u16;
        self.memory.peek8(VIDEO_RAM_START.wrapping_add(offset))
    }

    pub fn glyph_line(&self, code: u8, line: usize) -> u8 {
        let line = (line & 7) as u16;
        let rom_line = |code: u8| {
            self.memory
                .peek8(FONT_ROM_START.wrapping_add(code as u16 * 8 + line))
        };

        match (self.font, code) {
            (_, 0x00..=0x7F) => rom_line(code),
            (Font::Normal, _) => !rom_line(code - 0x80),
            (Font::UserDefined, _) => {
                let offset = (code - 0x80) as u16 * 8 + line;
                if (offset as u32) < USER_CHAR_LENGTH {
                    self.memory.peek8(USER_CHAR_START + offset)
                } else {
                    0x00
                }
            }
        }
    }

    pub fn draw(&mut self) {
        for line in 0..SCREEN_HEIGHT {
            self.render_line(line);
        }
    }

    fn render_line(&mut self, line: usize) {
        let mut pixel_ptr = line * SCREEN_WIDTH;
        for column in 0..WIDTH_CHARS {
            let code = self.code_at(column, line / 8);
            let pattern = self.glyph_line(code, line);

            for i in 0..8 {
                let mask = 0x80 >> i;
                self.screen_buffer[pixel_ptr + i] = if pattern & mask != 0 {
                    FOREGROUND
                } else {
                    BACKGROUND
                };
            }

            pixel_ptr += 8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_memory() -> MemorySystem {
        let mut font = vec![0u8; 0x2000];
        // 'A' drawn as a solid top line
        font[0x41 * 8] = 0xFF;
        MemorySystem::builder()
            .ram("udc", USER_CHAR_START, USER_CHAR_LENGTH)
            .ram("vram", VIDEO_RAM_START, VIDEO_RAM_LENGTH)
            .rom("basic", FONT_ROM_START, 0x2000, &font)
            .build()
            .unwrap()
    }

    #[test]
    fn test_text_from_video_ram() {
        let mut memory = screen_memory();
        memory.write_block(VIDEO_RAM_START, b"HELLO");

        let text = Renderer::new(&memory, Font::Normal).as_text();
        assert!(text.lines().next().unwrap().starts_with("HELLO"));
        assert_eq!(text.lines().count(), HEIGHT_CHARS);
    }

    #[test]
    fn test_normal_font_inverts_upper_half() {
        let memory = screen_memory();
        let renderer = Renderer::new(&memory, Font::Normal);

        assert_eq!(renderer.glyph_line(0x41, 0), 0xFF);
        assert_eq!(renderer.glyph_line(0xC1, 0), 0x00);
        assert_eq!(renderer.glyph_line(0xC1, 1), 0xFF);
    }

    #[test]
    fn test_user_defined_font_reads_character_ram() {
        let mut memory = screen_memory();
        memory.write8(USER_CHAR_START + 8 + 2, 0x3C);
        let renderer = Renderer::new(&memory, Font::UserDefined);

        assert_eq!(renderer.glyph_line(0x81, 2), 0x3C);
        assert_eq!(renderer.glyph_line(0xFF, 0), 0x00);
        assert_eq!(renderer.glyph_line(0x41, 0), 0xFF);
    }

    #[test]
    fn test_draw_first_line() {
        let mut memory = screen_memory();
        memory.write8(VIDEO_RAM_START, 0x41);
        let mut renderer = Renderer::new(&memory, Font::Normal);
        renderer.draw();

        assert!(renderer.screen_buffer[..8].iter().all(|p| *p == FOREGROUND));
        assert_eq!(renderer.screen_buffer[8], BACKGROUND);
    }
}
