use serde::{Deserialize, Serialize};

/// grid node index, `x` counts columns eastward and `y` rows northward
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct DatumZa {
    pub x: i32,
    pub y: i32,
}

/// local tangent plane offset in kilometres, `x` east and `y` north
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatumRe {
    pub x: f64,
    pub y: f64,
}

impl DatumZa {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// position in a row-major grid with the given number of columns
    pub fn unravel(&self, columns: usize) -> usize {
        self.y as usize * columns + self.x as usize
    }

    /// inverse of `unravel`
    pub fn enravel(jndex: usize, columns: usize) -> Self {
        Self {
            x: (jndex % columns) as i32,
            y: (jndex / columns) as i32,
        }
    }

    /// whether the datum lies inside a grid of given shape
    pub fn within(&self, columns: usize, rows: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < columns && (self.y as usize) < rows
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unravel_enravel() {
        let datum = DatumZa::new(3, 2);
        assert_eq!(datum.unravel(5), 13);
        assert_eq!(DatumZa::enravel(13, 5), datum);
        assert_eq!(DatumZa::enravel(0, 5), DatumZa::new(0, 0));
        assert_eq!(DatumZa::enravel(4, 5), DatumZa::new(4, 0));
    }

    #[test]
    fn within_bounds() {
        assert!(DatumZa::new(0, 0).within(2, 3));
        assert!(DatumZa::new(1, 2).within(2, 3));
        assert!(!DatumZa::new(2, 0).within(2, 3));
        assert!(!DatumZa::new(0, 3).within(2, 3));
        assert!(!DatumZa::new(-1, 0).within(2, 3));
    }
}
