//! The six axis-aligned directions of the block grid

use std::fmt;

/// An axis-aligned direction, or `None` for "no direction"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    None,
    /// +X
    East,
    /// -X
    West,
    /// +Y
    South,
    /// -Y
    North,
    /// +Z
    Up,
    /// -Z
    Down,
}

impl Facing {
    /// All six real directions, in id order
    pub const ALL: [Facing; 6] = [
        Facing::East,
        Facing::West,
        Facing::South,
        Facing::North,
        Facing::Up,
        Facing::Down,
    ];

    /// Unit offset along each axis
    pub const fn offsets(self) -> (i32, i32, i32) {
        match self {
            Facing::None => (0, 0, 0),
            Facing::East => (1, 0, 0),
            Facing::West => (-1, 0, 0),
            Facing::South => (0, 1, 0),
            Facing::North => (0, -1, 0),
            Facing::Up => (0, 0, 1),
            Facing::Down => (0, 0, -1),
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(
            self,
            Facing::East | Facing::West | Facing::South | Facing::North
        )
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self, Facing::Up | Facing::Down)
    }

    /// The direction pointing the other way
    pub const fn opposite(self) -> Facing {
        match self {
            Facing::None => Facing::None,
            Facing::East => Facing::West,
            Facing::West => Facing::East,
            Facing::South => Facing::North,
            Facing::North => Facing::South,
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
        }
    }

    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Unknown ids map to `Facing::None`
    pub const fn from_byte(id: u8) -> Facing {
        match id {
            1 => Facing::East,
            2 => Facing::West,
            3 => Facing::South,
            4 => Facing::North,
            5 => Facing::Up,
            6 => Facing::Down,
            _ => Facing::None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Facing::None => "None",
            Facing::East => "East",
            Facing::West => "West",
            Facing::South => "South",
            Facing::North => "North",
            Facing::Up => "Up",
            Facing::Down => "Down",
        }
    }

    /// Unknown names map to `Facing::None`
    pub fn from_name(name: &str) -> Facing {
        Self::ALL
            .into_iter()
            .find(|facing| facing.name() == name)
            .unwrap_or(Facing::None)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for facing in Facing::ALL {
            assert_eq!(Facing::from_byte(facing.to_byte()), facing);
        }
        assert_eq!(Facing::from_byte(42), Facing::None);
    }

    #[test]
    fn names() {
        assert_eq!(Facing::from_name("Up"), Facing::Up);
        assert_eq!(Facing::from_name("Sideways"), Facing::None);
        assert_eq!(Facing::North.to_string(), "North");
    }

    #[test]
    fn opposite_offsets_cancel() {
        for facing in Facing::ALL {
            let (ax, ay, az) = facing.offsets();
            let (bx, by, bz) = facing.opposite().offsets();
            assert_eq!((ax + bx, ay + by, az + bz), (0, 0, 0));
        }
    }

    #[test]
    fn orientation() {
        assert!(Facing::East.is_horizontal());
        assert!(!Facing::East.is_vertical());
        assert!(Facing::Down.is_vertical());
        assert!(!Facing::None.is_horizontal() && !Facing::None.is_vertical());
    }
}
