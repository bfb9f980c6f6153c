use serde::{Deserialize, Serialize};

/// A single grid cell. `y` grows northwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared euclidean distance, used for radial ordering.
    #[inline]
    pub fn dist_sq(self, other: Cell) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// One of the four edges of a rectangle, also used as a facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];
}

/// Axis-aligned, inclusive rectangle of cells occupied by a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl CellRect {
    /// Builds a rect from its south-west corner and its size in cells.
    ///
    /// Sizes below one are treated as one so a rect never ends up empty.
    pub fn from_origin(origin: Cell, width: i32, height: i32) -> Self {
        Self {
            min_x: origin.x,
            min_y: origin.y,
            max_x: origin.x + width.max(1) - 1,
            max_y: origin.y + height.max(1) - 1,
        }
    }

    /// Builds a rect of the given size centred on `center` (odd sizes are exact).
    pub fn centered(center: Cell, width: i32, height: i32) -> Self {
        Self::from_origin(center.offset(-(width / 2), -(height / 2)), width, height)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    #[inline]
    pub fn area(&self) -> usize {
        (self.width().max(0) as usize) * (self.height().max(0) as usize)
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    /// Every cell of the rect in row-major order, south row first.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + Clone {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y).flat_map(move |y| (min_x..=max_x).map(move |x| Cell::new(x, y)))
    }

    /// The two cells diagonally outside the corners of `side`, listed in
    /// increasing coordinate order along that edge.
    pub fn outer_corners(&self, side: Side) -> [Cell; 2] {
        match side {
            Side::North => [
                Cell::new(self.min_x - 1, self.max_y + 1),
                Cell::new(self.max_x + 1, self.max_y + 1),
            ],
            Side::South => [
                Cell::new(self.min_x - 1, self.min_y - 1),
                Cell::new(self.max_x + 1, self.min_y - 1),
            ],
            Side::East => [
                Cell::new(self.max_x + 1, self.min_y - 1),
                Cell::new(self.max_x + 1, self.max_y + 1),
            ],
            Side::West => [
                Cell::new(self.min_x - 1, self.min_y - 1),
                Cell::new(self.min_x - 1, self.max_y + 1),
            ],
        }
    }

    /// True if `cell` lies strictly beyond the given edge.
    #[inline]
    pub fn is_beyond(&self, side: Side, cell: Cell) -> bool {
        match side {
            Side::North => cell.y > self.max_y,
            Side::South => cell.y < self.min_y,
            Side::East => cell.x > self.max_x,
            Side::West => cell.x < self.min_x,
        }
    }

    /// How far `cell` sits past the given edge; zero or negative when it
    /// does not lie beyond it.
    #[inline]
    pub fn offset_beyond(&self, side: Side, cell: Cell) -> i32 {
        match side {
            Side::North => cell.y - self.max_y,
            Side::South => self.min_y - cell.y,
            Side::East => cell.x - self.max_x,
            Side::West => self.min_x - cell.x,
        }
    }
}
