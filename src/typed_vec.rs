// Arenas indexed by small typed handles.
//
// Every per-operation table (edges, intersections, vertices, spans) lives in
// one of these. Handles are `u32`s, so an index from one table can't be used to
// look into another by accident, and the tables stay compact.

macro_rules! typed_idx {
    ($vec_name:ident, $idx_name:ident, $dbg_prefix:expr) => {
        #[doc = concat!("A handle into a [`", stringify!($vec_name), "`].")]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
        #[serde(transparent)]
        pub struct $idx_name(u32);

        impl $idx_name {
            /// The position of this handle in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $idx_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", $dbg_prefix, self.0)
            }
        }
    };
}

macro_rules! impl_typed_vec {
    ($vec_name:ident, $idx_name:ident, $dbg_prefix:expr) => {
        typed_idx!($vec_name, $idx_name, $dbg_prefix);

        #[allow(dead_code)]
        impl<T> $vec_name<T> {
            fn idx(i: usize) -> $idx_name {
                debug_assert!(i <= u32::MAX as usize);
                $idx_name(i as u32)
            }

            /// Creates an empty arena with room for `cap` elements.
            pub fn with_capacity(cap: usize) -> Self {
                Self {
                    inner: Vec::with_capacity(cap),
                }
            }

            /// All the handles that are valid for this arena.
            pub fn indices(&self) -> impl Iterator<Item = $idx_name> + 'static {
                debug_assert!(self.inner.len() <= u32::MAX as usize);
                (0..self.inner.len() as u32).map($idx_name)
            }

            /// The number of elements.
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            /// Is this arena empty?
            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Adds a new element, returning its handle.
            pub fn push(&mut self, elt: T) -> $idx_name {
                self.inner.push(elt);
                Self::idx(self.inner.len() - 1)
            }

            /// Handles and elements, in insertion order.
            pub fn iter(&self) -> impl Iterator<Item = ($idx_name, &T)> + '_ {
                self.inner
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (Self::idx(i), t))
            }

            /// Handles and mutable elements, in insertion order.
            pub fn iter_mut(&mut self) -> impl Iterator<Item = ($idx_name, &mut T)> + '_ {
                self.inner
                    .iter_mut()
                    .enumerate()
                    .map(|(i, t)| (Self::idx(i), t))
            }

            /// Elements without their handles.
            pub fn values(&self) -> std::slice::Iter<'_, T> {
                self.inner.iter()
            }
        }

        impl<T> Default for $vec_name<T> {
            fn default() -> Self {
                Self { inner: Vec::new() }
            }
        }

        impl<T> std::ops::Index<$idx_name> for $vec_name<T> {
            type Output = T;

            fn index(&self, index: $idx_name) -> &Self::Output {
                &self.inner[index.index()]
            }
        }

        impl<T> std::ops::IndexMut<$idx_name> for $vec_name<T> {
            fn index_mut(&mut self, index: $idx_name) -> &mut T {
                &mut self.inner[index.index()]
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $vec_name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_map().entries(self.iter()).finish()
            }
        }
    };
}
