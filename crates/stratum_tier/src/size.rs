// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Byte-footprint measurement for cached values.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Reports how many bytes a value occupies, including everything it owns.
///
/// A byte-bounded tier charges each stored value with [`byte_size`](Self::byte_size)
/// at insert time. The measurement is deep: the inline size of the value plus
/// everything reachable through owned heap allocations.
///
/// Most types only implement [`heap_size`](Self::heap_size) and keep the default
/// `byte_size`. Types with a known footprint may override `byte_size` directly.
///
/// Measurements are deterministic for equal contents: strings and vectors count their
/// length rather than their spare capacity.
///
/// # Examples
///
/// ```
/// use stratum_tier::ByteSize;
///
/// struct Transcript {
///     video_id: u64,
///     text: String,
/// }
///
/// impl ByteSize for Transcript {
///     fn heap_size(&self) -> usize {
///         self.text.heap_size()
///     }
/// }
///
/// let transcript = Transcript { video_id: 7, text: "hello".to_string() };
/// assert_eq!(transcript.byte_size(), size_of::<Transcript>() + 5);
/// ```
pub trait ByteSize {
    /// Returns the bytes this value owns outside its inline representation.
    fn heap_size(&self) -> usize {
        0
    }

    /// Returns the total footprint of this value in bytes.
    fn byte_size(&self) -> usize {
        size_of_val(self) + self.heap_size()
    }
}

macro_rules! inline_only {
    ($($ty:ty),* $(,)?) => {
        $(impl ByteSize for $ty {})*
    };
}

inline_only!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
);

impl ByteSize for str {}

impl ByteSize for String {
    fn heap_size(&self) -> usize {
        self.len()
    }
}

impl<T: ByteSize> ByteSize for [T] {
    fn heap_size(&self) -> usize {
        self.iter().map(ByteSize::heap_size).sum()
    }
}

impl<T: ByteSize, const N: usize> ByteSize for [T; N] {
    fn heap_size(&self) -> usize {
        self.as_slice().heap_size()
    }
}

impl<T: ByteSize> ByteSize for Vec<T> {
    fn heap_size(&self) -> usize {
        self.as_slice().byte_size()
    }
}

impl<T: ByteSize + ?Sized> ByteSize for Box<T> {
    fn heap_size(&self) -> usize {
        (**self).byte_size()
    }
}

// Shared allocations are charged in full to every holder.
impl<T: ByteSize + ?Sized> ByteSize for Arc<T> {
    fn heap_size(&self) -> usize {
        (**self).byte_size()
    }
}

impl<T: ByteSize> ByteSize for Option<T> {
    fn heap_size(&self) -> usize {
        self.as_ref().map_or(0, ByteSize::heap_size)
    }
}

impl<A: ByteSize, B: ByteSize> ByteSize for (A, B) {
    fn heap_size(&self) -> usize {
        self.0.heap_size() + self.1.heap_size()
    }
}

impl<A: ByteSize, B: ByteSize, C: ByteSize> ByteSize for (A, B, C) {
    fn heap_size(&self) -> usize {
        self.0.heap_size() + self.1.heap_size() + self.2.heap_size()
    }
}

/// Bucket overhead is not included; only the stored keys and values are counted.
impl<K: ByteSize, V: ByteSize, S> ByteSize for HashMap<K, V, S> {
    fn heap_size(&self) -> usize {
        self.iter().map(|(k, v)| k.byte_size() + v.byte_size()).sum()
    }
}

impl<K: ByteSize, V: ByteSize> ByteSize for BTreeMap<K, V> {
    fn heap_size(&self) -> usize {
        self.iter().map(|(k, v)| k.byte_size() + v.byte_size()).sum()
    }
}
