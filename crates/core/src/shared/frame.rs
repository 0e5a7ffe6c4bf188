use ndarray::ArrayView3;

pub const FRAME_CHANNELS: usize = 3;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Frames carry a per-stream sequence number assigned at publication time
/// and a marker for synthetic placeholder frames, so callers can tell a
/// live capture apart from the "camera unavailable" canvas.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: usize,
    placeholder: bool,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * FRAME_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
            placeholder: false,
        }
    }

    /// Wraps a synthesized canvas. Placeholders are never real captures.
    pub fn placeholder(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            placeholder: true,
            ..Self::new(data, width, height, 0)
        }
    }

    /// Fills every pixel with one RGB color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * FRAME_CHANNELS)
            .collect();
        Self::new(data, width, height, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// A frame is usable when it has pixels and its buffer matches its shape.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * FRAME_CHANNELS
    }

    pub fn with_sequence(mut self, sequence: usize) -> Self {
        self.sequence = sequence;
        self
    }

    /// `(height, width, channel)` view over the pixel buffer.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, FRAME_CHANNELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.sequence(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_placeholder());
        assert!(frame.is_valid());
    }

    #[test]
    fn test_placeholder_is_flagged() {
        let frame = Frame::placeholder(vec![7u8; 12], 2, 2);
        assert!(frame.is_placeholder());
        assert_eq!(frame.sequence(), 0);
    }

    #[test]
    fn test_filled_repeats_color() {
        let frame = Frame::filled(3, 2, [10, 20, 30]);
        assert_eq!(frame.data().len(), 18);
        for px in frame.data().chunks(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::filled(2, 2, [100, 100, 100]);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    fn test_with_sequence_keeps_pixels() {
        let frame = Frame::filled(2, 1, [1, 2, 3]).with_sequence(42);
        assert_eq!(frame.sequence(), 42);
        assert_eq!(&frame.data()[..3], &[1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_zero_sized_frame_is_invalid() {
        let frame = Frame::placeholder(Vec::new(), 0, 0);
        assert!(!frame.is_valid());
    }
}
