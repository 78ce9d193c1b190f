/// Reports an approximate in-memory size in bytes.
pub trait SizeHint {
    /// Returns the approximate size in bytes for this value.
    fn size_hint(&self) -> usize;
}

impl SizeHint for String {
    fn size_hint(&self) -> usize {
        self.len()
    }
}

impl SizeHint for Vec<u8> {
    fn size_hint(&self) -> usize {
        self.len()
    }
}

impl<T> SizeHint for Option<T>
where
    T: SizeHint,
{
    fn size_hint(&self) -> usize {
        match self {
            Some(value) => value.size_hint(),
            None => 0,
        }
    }
}
