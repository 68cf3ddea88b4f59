//! Opus frame type.

/// Largest packet size DTX emits while suppressing a silent interval.
/// Anything at or under this length carries no speech payload.
pub const DTX_FILLER_MAX: usize = 2;

/// Raw Opus encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(pub Vec<u8>);

impl Frame {
    /// Creates a new frame from bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Creates a frame from a byte slice.
    pub fn from_slice(data: &[u8]) -> Self {
        Self(data.to_vec())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the frame and returns the owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true for DTX filler packets that need not be transmitted.
    pub fn is_dtx_filler(&self) -> bool {
        self.0.len() <= DTX_FILLER_MAX
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for Frame {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(vec![]);
        assert!(frame.is_empty());
        assert_eq!(frame.len(), 0);
    }

    #[test]
    fn test_frame_new() {
        let data = vec![0x01, 0x02, 0x03];
        let frame = Frame::new(data.clone());
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_empty());
        assert_eq!(frame.as_bytes(), &data[..]);
    }

    #[test]
    fn test_frame_from_slice() {
        let data = [0x48, 0x01, 0x02];
        let frame = Frame::from_slice(&data);
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_frame_into_bytes() {
        let data = vec![0x48, 0x01, 0x02];
        let frame = Frame::new(data.clone());
        assert_eq!(frame.into_bytes(), data);
    }

    #[test]
    fn test_dtx_filler() {
        assert!(Frame::new(vec![]).is_dtx_filler());
        assert!(Frame::new(vec![0x48]).is_dtx_filler());
        assert!(Frame::new(vec![0x48, 0x00]).is_dtx_filler());
        assert!(!Frame::new(vec![0x48, 0x00, 0x01]).is_dtx_filler());
    }

    #[test]
    fn test_frame_as_ref() {
        let data = vec![0x48, 0x01, 0x02];
        let frame = Frame::new(data.clone());
        let slice: &[u8] = frame.as_ref();
        assert_eq!(slice, &data[..]);
    }

    #[test]
    fn test_frame_from_vec() {
        let data = vec![0x48, 0x01, 0x02];
        let frame: Frame = data.clone().into();
        assert_eq!(frame.as_bytes(), &data[..]);
    }

    #[test]
    fn test_frame_from_slice_trait() {
        let data: &[u8] = &[0x48, 0x01, 0x02];
        let frame: Frame = data.into();
        assert_eq!(frame.as_bytes(), data);
    }

    #[test]
    fn test_frame_clone() {
        let frame1 = Frame::new(vec![0x48, 0x01]);
        let frame2 = frame1.clone();
        assert_eq!(frame1, frame2);
    }
}
