use std::fmt::Debug;

use num_traits::Float;

/// A trait for floating-point types that can be used for point coordinates.
///
/// This trait is sealed and cannot be implemented for external types. The
/// packed node encoding embeds shrink boxes into a `u32` arena and only
/// knows the byte footprint of the two standard float widths.
pub trait CoordFloat:
    private::Sealed + Float + Debug + Send + Sync + bytemuck::Pod + 'static
{
    /// The number of bytes per coordinate. Determines the slot footprint of
    /// a shrink node's embedded box.
    const BYTES_PER_ELEMENT: usize;
}

impl CoordFloat for f32 {
    const BYTES_PER_ELEMENT: usize = 4;
}

impl CoordFloat for f64 {
    const BYTES_PER_ELEMENT: usize = 8;
}

mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
