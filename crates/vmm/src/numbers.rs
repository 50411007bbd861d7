//! Page and frame number types.
//!
//! Page numbers index the virtual address space, frame numbers index physical memory. Both
//! are plain indices; converting them to addresses needs a [`Geometry`](crate::Geometry)
//! because the page size is chosen at engine construction.

use core::fmt;

/// Macro to define common page/frame number functionality.
///
/// Generates the newtype and the formatting impls shared by frame and page numbers.
macro_rules! impl_page_number_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new page/frame number.
            #[inline]
            pub const fn new(number: u64) -> Self {
                Self(number)
            }

            /// Returns the raw page/frame number.
            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Forward so width/alignment flags work in table layouts.
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

impl_page_number_common!(
    FrameNumber,
    "A physical memory frame number.\n\n\
     Frame numbers are zero-indexed; frame `n` starts at physical address `n * page_size`."
);

impl_page_number_common!(
    PageNumber,
    "A virtual memory page number.\n\n\
     Page numbers are zero-indexed; page `n` starts at virtual address `n * page_size`."
);
