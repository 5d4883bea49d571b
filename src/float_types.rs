// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// General-purpose tolerance for plane classification and interpolation guards.
#[cfg(feature = "f32")]
pub const EPSILON: Real = 1e-4;
/// General-purpose tolerance for plane classification and interpolation guards.
#[cfg(feature = "f64")]
pub const EPSILON: Real = 1e-6;

/// Tolerance under which two vertex positions in the same polygon loop are
/// considered coincident during mesh cleanup.
///
/// Distinct from [`WELD_EPSILON`]: cleanup repairs topology after clipping,
/// welding merges vertices across a whole collision soup. The two must not be
/// conflated.
pub const POSITION_EPSILON: Real = 1e-5;

/// Tolerance under which two positions in a collision triangle soup are welded
/// into one connectivity vertex.
pub const WELD_EPSILON: Real = 1e-2;
