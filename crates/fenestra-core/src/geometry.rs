use std::ops::{Add, Mul};

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl<T: Copy> Rect<T> {
    pub fn size(&self) -> Size<T> {
        Size::new(self.width, self.height)
    }
}

impl<T: Copy + PartialOrd + Add<Output = T>> Rect<T> {
    /// Half-open containment: the top-left edge is inside, the bottom-right edge is not.
    pub fn contains(&self, x: T, y: T) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T: Copy + Default + PartialEq> Size<T> {
    /// True when neither dimension is zero.
    pub fn is_valid(&self) -> bool {
        self.width != T::default() && self.height != T::default()
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(0, 0, 10, 5);
        assert!(rect.contains(0, 0));
        assert!(rect.contains(9, 4));
        assert!(!rect.contains(10, 4));
        assert!(!rect.contains(9, 5));
        assert!(!rect.contains(-1, 0));
    }

    #[test]
    fn size_validity() {
        assert!(Size::new(1u32, 1).is_valid());
        assert!(!Size::new(0u32, 10).is_valid());
        assert_eq!(Size::new(2u32, 3) * 2, Size::new(4, 6));
    }
}
