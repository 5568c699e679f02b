//! User program images: PROG containers (v1 and v2) and BASIC source text.
//!
//! Loading only writes bytes through [`MemorySystem`]; it never touches the
//! CPU. Callers reset the CPU afterwards.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::ProgramLoadError, memory::MemorySystem};

pub const BASIC_START_ADDRESS: u16 = 0x0246;
pub const BASIC_POINTER_BASE: u16 = 0x0006;
pub const BASIC_POINTER_COUNT: u16 = 4;
pub const BASIC_TERMINATOR: u8 = 0xDF;
pub const MAX_BASIC_LINE_LENGTH: usize = 72;
pub const BASIC_END_LIMIT: u32 = 0x7FFF;

pub const PROG_MAGIC: &[u8; 4] = b"PROG";
pub const MAX_NAME_LENGTH: u32 = 256;
pub const MAX_PROGRAM_LENGTH: u32 = 65536;
pub const MAX_COMMENT_LENGTH: u32 = 1024;
pub const MAX_BINARY_SECTIONS: usize = 256;

const SECTION_PNAM: u32 = u32::from_le_bytes(*b"PNAM");
const SECTION_PBAS: u32 = u32::from_le_bytes(*b"PBAS");
const SECTION_PBIN: u32 = u32::from_le_bytes(*b"PBIN");
const SECTION_CMNT: u32 = u32::from_le_bytes(*b"CMNT");

type Result<T> = std::result::Result<T, ProgramLoadError>;

/// An inclusive address range a program occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRegion {
    pub start: u16,
    pub end: u16,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfo {
    pub name: String,
    pub comment: String,
    pub basic_area: bool,
    pub regions: Vec<AddressRegion>,
    pub path: Option<String>,
}

impl ProgramInfo {
    /// Records `start..=end`; empty ranges are dropped.
    fn add_region(&mut self, start: u32, end: i64, comment: String) {
        if end >= start as i64 {
            self.regions.push(AddressRegion {
                start: start as u16,
                end: end as u16,
                comment,
            });
        }
    }
}

struct ProgReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ProgReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ProgramLoadError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self, max_len: u32) -> Result<String> {
        let len = self.u32()?;
        if len > max_len {
            return Err(ProgramLoadError::InvalidSection(
                "string length out of range",
            ));
        }
        let bytes = self.bytes(len as usize)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

fn le32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn utf8(bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn write_block(memory: &mut MemorySystem, start: u32, data: &[u8]) {
    for (offset, value) in data.iter().enumerate() {
        memory.write8((start as usize + offset) as u16, *value);
    }
}

/// Terminates a BASIC program ending at `final_address` and points the
/// interpreter's four text pointers at it. Returns the address used.
pub fn finalize_basic(memory: &mut MemorySystem, final_address: i64) -> u16 {
    let final_address = final_address.max(BASIC_START_ADDRESS as i64 - 1) as u16;
    for offset in 1..=3 {
        memory.write8(final_address.wrapping_add(offset), BASIC_TERMINATOR);
    }

    let mut pointer = final_address;
    for index in 0..BASIC_POINTER_COUNT {
        memory.write16(BASIC_POINTER_BASE + index * 2, pointer);
        pointer = pointer.wrapping_add(1);
    }
    final_address
}

/// Loads a PROG container from memory-resident bytes.
pub fn load_prog(memory: &mut MemorySystem, image: &[u8]) -> Result<ProgramInfo> {
    let mut reader = ProgReader::new(image);
    let magic = reader
        .bytes(4)
        .map_err(|_| ProgramLoadError::InvalidMagic)?;
    if magic != PROG_MAGIC {
        return Err(ProgramLoadError::InvalidMagic);
    }

    let mut info = ProgramInfo::default();
    match reader.u32()? {
        1 => load_prog_v1(&mut reader, memory, &mut info)?,
        2 => load_prog_v2(&mut reader, memory, &mut info)?,
        version => return Err(ProgramLoadError::UnsupportedVersion(version)),
    }
    tracing::debug!(
        "[PROG] loaded {:?}, {} region(s)",
        info.name,
        info.regions.len()
    );
    Ok(info)
}

fn load_prog_v1(
    reader: &mut ProgReader,
    memory: &mut MemorySystem,
    info: &mut ProgramInfo,
) -> Result<()> {
    let name = reader.string(MAX_NAME_LENGTH)?;
    let start = reader.u32()?;
    let length = reader.u32()?;
    if start as u64 + length as u64 > MAX_PROGRAM_LENGTH as u64 {
        return Err(ProgramLoadError::ProgramTooLarge);
    }
    let flag = reader.u32()?;
    let payload = reader.bytes(length as usize)?;
    write_block(memory, start, payload);

    let last = start as i64 + length as i64 - 1;
    if flag == 0 {
        let last = finalize_basic(memory, last);
        info.basic_area = true;
        info.add_region(BASIC_START_ADDRESS as u32, last as i64, String::new());
    } else {
        info.add_region(start, last, String::new());
    }
    info.name = name;
    Ok(())
}

fn load_prog_v2(
    reader: &mut ProgReader,
    memory: &mut MemorySystem,
    info: &mut ProgramInfo,
) -> Result<()> {
    let mut seen_name = false;
    let mut seen_basic = false;
    let mut seen_comment = false;
    let mut binary_sections = 0;

    loop {
        let header_len = reader.remaining().min(8);
        let header = reader.bytes(header_len)?;
        if header.is_empty() {
            break;
        }
        if header.len() < 8 {
            if header.iter().all(|b| *b == 0) {
                break;
            }
            return Err(ProgramLoadError::UnexpectedEof);
        }

        let id = le32(header, 0).unwrap_or_default();
        let length = le32(header, 4).unwrap_or_default();
        let payload = reader.bytes(length as usize)?;

        match id {
            SECTION_PNAM => {
                if seen_name {
                    continue;
                }
                seen_name = true;
                let name_len = le32(payload, 0)
                    .ok_or(ProgramLoadError::InvalidSection("invalid PNAM section length"))?;
                if name_len > MAX_NAME_LENGTH || 4 + name_len as u64 > length as u64 {
                    return Err(ProgramLoadError::InvalidSection(
                        "invalid PNAM section length",
                    ));
                }
                info.name = utf8(&payload[4..4 + name_len as usize])?;
            }
            SECTION_PBAS => {
                if seen_basic {
                    continue;
                }
                seen_basic = true;
                let program_len = le32(payload, 0)
                    .ok_or(ProgramLoadError::InvalidSection("invalid PBAS section length"))?;
                if program_len as u64 + 4 != length as u64 {
                    return Err(ProgramLoadError::InvalidSection(
                        "invalid PBAS section length",
                    ));
                }
                if program_len > MAX_PROGRAM_LENGTH {
                    return Err(ProgramLoadError::ProgramTooLarge);
                }
                write_block(memory, BASIC_START_ADDRESS as u32, &payload[4..]);
                let last = BASIC_START_ADDRESS as i64 + program_len as i64 - 1;
                let last = finalize_basic(memory, last);
                info.basic_area = true;
                info.add_region(BASIC_START_ADDRESS as u32, last as i64, String::new());
            }
            SECTION_PBIN => {
                if binary_sections >= MAX_BINARY_SECTIONS {
                    continue;
                }
                binary_sections += 1;
                let (start, data, comment) = parse_binary_section(payload)?;
                write_block(memory, start, data);
                info.add_region(start, start as i64 + data.len() as i64 - 1, comment);
            }
            SECTION_CMNT => {
                if seen_comment {
                    continue;
                }
                seen_comment = true;
                let comment_len = le32(payload, 0)
                    .ok_or(ProgramLoadError::InvalidSection("invalid CMNT section length"))?;
                if comment_len > MAX_COMMENT_LENGTH || 4 + comment_len as u64 > length as u64 {
                    return Err(ProgramLoadError::InvalidSection("invalid CMNT payload"));
                }
                info.comment = utf8(&payload[4..4 + comment_len as usize])?;
            }
            other => tracing::debug!("[PROG] skipping section {:08X}", other),
        }
    }
    Ok(())
}

fn parse_binary_section(payload: &[u8]) -> Result<(u32, &[u8], String)> {
    let (start, data_len) = match (le32(payload, 0), le32(payload, 4)) {
        (Some(start), Some(len)) => (start, len),
        _ => {
            return Err(ProgramLoadError::InvalidSection(
                "invalid PBIN section length",
            ))
        }
    };
    if start as u64 + data_len as u64 > MAX_PROGRAM_LENGTH as u64 {
        return Err(ProgramLoadError::InvalidSection("PBIN section exceeds limits"));
    }
    let data_end = 8 + data_len as usize;
    if data_end > payload.len() {
        return Err(ProgramLoadError::InvalidSection("invalid PBIN data length"));
    }

    let comment = match payload.len() - data_end {
        0 => String::new(),
        1..=3 => {
            return Err(ProgramLoadError::InvalidSection(
                "invalid PBIN comment length",
            ))
        }
        _ => {
            let comment_len = le32(payload, data_end).unwrap_or_default();
            let comment_start = data_end + 4;
            let comment_end = comment_start + comment_len as usize;
            if comment_len > MAX_COMMENT_LENGTH || comment_end > payload.len() {
                return Err(ProgramLoadError::InvalidSection("invalid PBIN comment"));
            }
            utf8(&payload[comment_start..comment_end])?
        }
    };

    Ok((start, &payload[8..data_end], comment))
}

/// Tokenizes nothing: BASIC text is stored as upper-cased characters with
/// `\hh` escapes for codes that have no printable form.
pub fn load_basic_text(memory: &mut MemorySystem, text: &str) -> Result<ProgramInfo> {
    let mut info = ProgramInfo {
        basic_area: true,
        ..Default::default()
    };
    let mut addr = BASIC_START_ADDRESS as u32;

    for raw_line in text.lines() {
        let line = raw_line.trim().to_uppercase();
        if line.is_empty() {
            continue;
        }
        let (number, rest) = split_line_number(&line, raw_line)?;
        let content = encode_basic_content(rest, raw_line)?;

        if addr + 2 > BASIC_END_LIMIT {
            return Err(ProgramLoadError::OutOfMemory);
        }
        memory.write16(addr as u16, number);
        addr += 2;

        for byte in &content {
            if addr > BASIC_END_LIMIT {
                return Err(ProgramLoadError::OutOfMemory);
            }
            memory.write8(addr as u16, *byte);
            addr += 1;
        }

        if 2 + content.len() > MAX_BASIC_LINE_LENGTH {
            return Err(ProgramLoadError::LineTooLong(raw_line.trim_end().to_string()));
        }
        if addr > BASIC_END_LIMIT {
            return Err(ProgramLoadError::OutOfMemory);
        }
        memory.write8(addr as u16, 0x00);
        addr += 1;
    }

    let last = finalize_basic(memory, addr as i64 - 1);
    info.add_region(BASIC_START_ADDRESS as u32, last as i64, String::new());
    Ok(info)
}

fn split_line_number<'a>(line: &'a str, raw_line: &str) -> Result<(u16, &'a str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return Err(ProgramLoadError::MissingLineNumber(
            raw_line.trim_end().to_string(),
        ));
    }

    let number = line[..digits].parse::<u32>().unwrap_or(u32::MAX);
    if !(1..=32767).contains(&number) {
        return Err(ProgramLoadError::InvalidLineNumber {
            number,
            line: raw_line.trim_end().to_string(),
        });
    }
    Ok((number as u16, line[digits..].trim_start()))
}

fn encode_basic_content(content: &str, raw_line: &str) -> Result<Vec<u8>> {
    let chars: Vec<char> = content.chars().collect();
    let mut bytes = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' {
            let escape = chars
                .get(i + 1..i + 3)
                .map(|digits| digits.iter().collect::<String>())
                .and_then(|digits| u8::from_str_radix(&digits, 16).ok())
                .ok_or_else(|| ProgramLoadError::InvalidEscape(raw_line.trim_end().to_string()))?;
            bytes.push(escape);
            i += 3;
        } else {
            bytes.push(chars[i] as u32 as u8);
            i += 1;
        }
    }
    Ok(bytes)
}

/// Loads a program file, picking the format from its extension.
pub fn load_program_file(memory: &mut MemorySystem, path: &Path) -> Result<ProgramInfo> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut info = match extension.as_str() {
        "prg" | "prog" => load_prog(memory, &fs::read(path)?)?,
        "bas" => load_basic_text(memory, &String::from_utf8(fs::read(path)?)?)?,
        _ => {
            return Err(ProgramLoadError::UnsupportedFormat(format!(
                ".{}",
                extension
            )))
        }
    };

    if info.name.is_empty() {
        info.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_uppercase())
            .unwrap_or_default();
    }
    info.path = Some(path.display().to_string());
    tracing::info!("Loaded program {} from {}", info.name, path.display());
    Ok(info)
}

/// Extracts the ROM bytes from a BASIC ROM file.
///
/// ROM dumps usually come wrapped in a v1 PROG header; anything else is
/// taken as a raw image.
pub fn rom_payload(image: &[u8]) -> Vec<u8> {
    if !image.starts_with(PROG_MAGIC) {
        return image.to_vec();
    }

    let field = |offset: usize| le32(image, offset).unwrap_or_default() as usize;
    let name_len = field(8);
    let header = 12 + name_len;
    let data_len = field(header + 4);
    let data_start = (header + 12).min(image.len());
    let data_end = data_start.saturating_add(data_len).min(image.len());

    image[data_start..data_end].to_vec()
}
