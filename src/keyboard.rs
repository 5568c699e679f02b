use serde::{Deserialize, Serialize};

use crate::error::KeyboardError;

pub const KEY_MATRIX_ROWS: usize = 16;
const ROW_RELEASED: u8 = 0xFF;

/// JR-100 key matrix: 16 rows of 8 bits, a cleared bit means pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    matrix: [u8; KEY_MATRIX_ROWS],
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            matrix: [ROW_RELEASED; KEY_MATRIX_ROWS],
        }
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    fn check(row: usize, bit: u8) -> Result<(), KeyboardError> {
        if row >= KEY_MATRIX_ROWS || bit >= 8 {
            return Err(KeyboardError::InvalidKey { row, bit });
        }
        Ok(())
    }

    pub fn press(&mut self, row: usize, bit: u8) -> Result<(), KeyboardError> {
        Self::check(row, bit)?;
        self.matrix[row] &= !(1 << bit);
        Ok(())
    }

    pub fn release(&mut self, row: usize, bit: u8) -> Result<(), KeyboardError> {
        Self::check(row, bit)?;
        self.matrix[row] |= 1 << bit;
        Ok(())
    }

    pub fn set_matrix(&mut self, rows: &[u8]) -> Result<(), KeyboardError> {
        if rows.len() != KEY_MATRIX_ROWS {
            return Err(KeyboardError::InvalidMatrix(rows.len()));
        }
        self.matrix.copy_from_slice(rows);
        Ok(())
    }

    pub fn matrix(&self) -> &[u8; KEY_MATRIX_ROWS] {
        &self.matrix
    }

    /// Row value, or all-released for rows the hardware does not decode.
    pub fn row(&self, row: usize) -> u8 {
        self.matrix.get(row).copied().unwrap_or(ROW_RELEASED)
    }

    pub fn clear(&mut self) {
        self.matrix = [ROW_RELEASED; KEY_MATRIX_ROWS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut keyboard = Keyboard::new();
        keyboard.press(1, 3).unwrap();
        assert_eq!(keyboard.row(1) & (1 << 3), 0);

        keyboard.release(1, 3).unwrap();
        assert_eq!(keyboard.row(1), 0xFF);
    }

    #[test]
    fn test_out_of_range_keys_rejected() {
        let mut keyboard = Keyboard::new();
        assert_eq!(
            keyboard.press(16, 0),
            Err(KeyboardError::InvalidKey { row: 16, bit: 0 })
        );
        assert_eq!(
            keyboard.release(0, 8),
            Err(KeyboardError::InvalidKey { row: 0, bit: 8 })
        );
    }

    #[test]
    fn test_matrix_must_have_sixteen_rows() {
        let mut keyboard = Keyboard::new();
        assert!(keyboard.set_matrix(&[0xFF; 16]).is_ok());
        assert_eq!(
            keyboard.set_matrix(&[0xFF; 15]),
            Err(KeyboardError::InvalidMatrix(15))
        );
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut keyboard = Keyboard::new();
        keyboard.set_matrix(&[0x00; 16]).unwrap();
        keyboard.clear();
        assert!(keyboard.matrix().iter().all(|row| *row == 0xFF));
    }
}
