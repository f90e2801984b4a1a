//! The closed set of supported die kinds.

use std::fmt;

/// Whether a die's shown value is read from the face pointing away from
/// gravity or toward it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceReadingConvention {
    /// The shown value is on the face pointing up. All kinds but the d4.
    Upward,
    /// The shown value is on the face touching the ground. Only the d4,
    /// whose apex points up when it lands.
    Downward,
}

/// One of the six supported polyhedral die kinds.
///
/// Per-kind differences (vertex tables, reading convention, throw tuning)
/// are data looked up through this tag; there is no per-kind behavior
/// hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DieKind {
    /// Four-sided tetrahedron.
    D4,
    /// Six-sided cube.
    D6,
    /// Eight-sided octahedron.
    D8,
    /// Ten-sided pentagonal trapezohedron.
    D10,
    /// Twelve-sided dodecahedron.
    D12,
    /// Twenty-sided icosahedron.
    D20,
}

impl DieKind {
    /// All supported kinds, smallest first.
    pub const ALL: [DieKind; 6] = [
        DieKind::D4,
        DieKind::D6,
        DieKind::D8,
        DieKind::D10,
        DieKind::D12,
        DieKind::D20,
    ];

    /// Number of distinct values this kind can show.
    pub fn value_count(self) -> u32 {
        match self {
            DieKind::D4 => 4,
            DieKind::D6 => 6,
            DieKind::D8 => 8,
            DieKind::D10 => 10,
            DieKind::D12 => 12,
            DieKind::D20 => 20,
        }
    }

    /// Conventional label, e.g. `"d6"`.
    pub fn label(self) -> &'static str {
        match self {
            DieKind::D4 => "d4",
            DieKind::D6 => "d6",
            DieKind::D8 => "d8",
            DieKind::D10 => "d10",
            DieKind::D12 => "d12",
            DieKind::D20 => "d20",
        }
    }

    /// Look up a kind by its side count. `None` for non-standard dice,
    /// which are always represented virtually.
    pub fn from_sides(sides: u32) -> Option<DieKind> {
        match sides {
            4 => Some(DieKind::D4),
            6 => Some(DieKind::D6),
            8 => Some(DieKind::D8),
            10 => Some(DieKind::D10),
            12 => Some(DieKind::D12),
            20 => Some(DieKind::D20),
            _ => None,
        }
    }

    /// How a settled die of this kind is read.
    pub fn reading_convention(self) -> FaceReadingConvention {
        match self {
            DieKind::D4 => FaceReadingConvention::Downward,
            _ => FaceReadingConvention::Upward,
        }
    }
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
