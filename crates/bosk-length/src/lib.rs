use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use text_size::TextSize;

/// An additive measure of source text: a byte offset plus character, row and
/// column counts. Positions on the parse stack are sums of these.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Length {
    pub bytes: TextSize,
    pub chars: u32,
    pub rows: u32,
    pub columns: u32,
}

impl Length {
    pub const ZERO: Length = Length { bytes: TextSize::new(0), chars: 0, rows: 0, columns: 0 };

    pub const fn new(bytes: u32, chars: u32, rows: u32, columns: u32) -> Self {
        Self { bytes: TextSize::new(bytes), chars, rows, columns }
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes + rhs.bytes,
            chars: self.chars + rhs.chars,
            rows: self.rows + rhs.rows,
            columns: self.columns + rhs.columns,
        }
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

impl Mul<u32> for Length {
    type Output = Length;

    fn mul(self, factor: u32) -> Length {
        Length {
            bytes: TextSize::new(u32::from(self.bytes) * factor),
            chars: self.chars * factor,
            rows: self.rows * factor,
            columns: self.columns * factor,
        }
    }
}

impl Sum for Length {
    fn sum<I: Iterator<Item = Length>>(iter: I) -> Length {
        iter.fold(Length::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_additive_identity() {
        let len = Length::new(2, 3, 0, 3);
        assert_eq!(len + Length::ZERO, len);
        assert_eq!(Length::ZERO + len, len);
    }

    #[test]
    fn addition_is_componentwise() {
        let sum = Length::new(2, 3, 0, 3) + Length::new(1, 1, 2, 5);
        assert_eq!(sum, Length::new(3, 4, 2, 8));

        let mut len = Length::new(2, 3, 0, 3);
        len += Length::new(2, 3, 0, 3);
        assert_eq!(len, Length::new(2, 3, 0, 3) * 2);
    }

    #[test]
    fn scalar_multiply() {
        assert_eq!(Length::new(2, 3, 0, 3) * 3, Length::new(6, 9, 0, 9));
        assert_eq!(Length::new(2, 3, 0, 3) * 0, Length::ZERO);
    }

    #[test]
    fn sum_of_lengths() {
        let total: Length = [Length::new(1, 1, 0, 1); 4].into_iter().sum();
        assert_eq!(total, Length::new(4, 4, 0, 4));
    }
}
