#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Anything the map hosts as an independently managed overlay.
pub trait Layer {
    fn id(&self) -> LayerId;

    /// Number of live canvas objects this layer currently owns.
    fn object_count(&self) -> usize;
}
