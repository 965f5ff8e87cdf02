//! A1-style cell coordinates

use std::fmt;
use std::str::FromStr;

use crate::error::{XlsxError, XlsxResult};

/// Largest column index a worksheet may use (XFD).
pub const MAX_COL: u16 = 16_383;

/// A cell coordinate such as `B2`.
///
/// Rows and columns are 0-based internally and 1-based / lettered in display.
/// Ordering is row-major, which is the order cells are scanned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference. `$` markers are accepted and ignored.
    ///
    /// ```
    /// use sheet_recalc_xlsx::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// assert_eq!(CellAddress::parse("$AA$10").unwrap().col, 26);
    /// ```
    pub fn parse(s: &str) -> XlsxResult<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| XlsxError::InvalidAddress(s.to_string()))?;
        let (letters, digits) = cleaned.split_at(split);

        let col = Self::letters_to_column(letters)
            .ok_or_else(|| XlsxError::InvalidAddress(s.to_string()))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| XlsxError::InvalidAddress(s.to_string()))?;
        if row == 0 {
            return Err(XlsxError::InvalidAddress(s.to_string()));
        }

        Ok(Self::new(row - 1, col))
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA)
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::new();
        let mut n = u32::from(col) + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        String::from_utf8(letters).unwrap_or_default()
    }

    /// Convert column letters to an index, `None` when not a valid column.
    pub fn letters_to_column(letters: &str) -> Option<u16> {
        if letters.is_empty() {
            return None;
        }
        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > u32::from(MAX_COL) + 1 {
                return None;
            }
        }
        Some((col - 1) as u16)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), u64::from(self.row) + 1)
    }
}

impl FromStr for CellAddress {
    type Err = XlsxError;

    fn from_str(s: &str) -> XlsxResult<Self> {
        Self::parse(s)
    }
}
