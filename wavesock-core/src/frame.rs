//! WebSocket frame encoding and parsing
//!
//! Wavesock handles exactly one frame shape: a final, unfragmented text
//! frame with a 7-bit payload length. Everything else on the wire is
//! detected and rejected rather than silently mis-read. Encoding and
//! parsing share one codec; which side masks is decided by the
//! [`Role`] the codec is constructed with.

use crate::{
    error::{Error, FrameError, Result},
    protocol::{constants::MAX_SINGLE_FRAME_PAYLOAD, frame::*, Opcode, Role},
    transport::TransportStream,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// A single WebSocket frame
///
/// Frames are transient: constructed, serialized or parsed, and
/// discarded per message.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Indicates if this is the final frame in a message (always true
    /// for frames this library produces)
    pub fin: bool,
    /// Frame opcode
    pub opcode: Opcode,
    /// Indicates if the payload arrived masked
    pub masked: bool,
    /// Masking key (present iff masked)
    pub mask: Option<[u8; 4]>,
    /// Payload data, already unmasked
    pub payload: Bytes,
}

impl Frame {
    /// Create an unmasked text frame
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self {
            fin: true,
            opcode: Opcode::Text,
            masked: false,
            mask: None,
            payload: payload.into(),
        }
    }

    /// Get the payload length
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Consume the frame, returning its payload as text
    pub fn into_text(self) -> Result<String> {
        String::from_utf8(self.payload.to_vec()).map_err(|_| FrameError::InvalidUtf8.into())
    }

    /// Parse one frame from the front of `buf`, enforcing the masking
    /// policy of the receiving `role`.
    ///
    /// On success the frame's bytes are consumed from `buf`. Returns
    /// [`FrameError::InsufficientData`] when `buf` does not yet hold a
    /// complete frame; header validation errors are raised as soon as
    /// the two header bytes are available, before any payload arrives.
    pub fn parse(buf: &mut BytesMut, role: Role) -> Result<Self> {
        if buf.len() < 2 {
            return Err(FrameError::InsufficientData {
                needed: 2,
                have: buf.len(),
            }
            .into());
        }

        let first_byte = buf[0];
        let second_byte = buf[1];

        if first_byte & FIN_BIT == 0 {
            return Err(FrameError::UnsupportedFragmentation.into());
        }

        let opcode_raw = first_byte & OPCODE_MASK;
        if Opcode::from(opcode_raw) != Some(Opcode::Text) {
            return Err(FrameError::UnsupportedFrameType(opcode_raw).into());
        }

        let len_field = second_byte & PAYLOAD_LEN_MASK;
        if len_field >= PAYLOAD_LEN_16 {
            return Err(FrameError::UnsupportedExtendedLength(len_field).into());
        }
        let payload_len = len_field as usize;

        let masked = second_byte & MASK_BIT != 0;
        let expected = role.expects_masked_input();
        if masked != expected {
            return Err(FrameError::MaskingPolicyViolation { masked, expected }.into());
        }

        let needed = 2 + if masked { MASKING_KEY_LEN } else { 0 } + payload_len;
        if buf.len() < needed {
            return Err(FrameError::InsufficientData {
                needed,
                have: buf.len(),
            }
            .into());
        }

        buf.advance(2);
        let mask = if masked {
            let mut key = [0u8; MASKING_KEY_LEN];
            key.copy_from_slice(&buf[..MASKING_KEY_LEN]);
            buf.advance(MASKING_KEY_LEN);
            Some(key)
        } else {
            None
        };

        let mut payload = buf.split_to(payload_len);
        if let Some(key) = mask {
            apply_mask(&mut payload, &key);
        }

        Ok(Frame {
            fin: true,
            opcode: Opcode::Text,
            masked,
            mask,
            payload: payload.freeze(),
        })
    }
}

/// XOR `data` in place with `mask` cycled every 4 bytes
///
/// Applying the same key twice is the identity, so the one transform
/// serves both masking and unmasking.
pub fn apply_mask(data: &mut [u8], mask: &[u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Frame codec bound to one peer role
///
/// The role fixes both directions of the masking rule: what the codec
/// puts on outgoing frames and what it demands of incoming ones.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    role: Role,
}

impl FrameCodec {
    /// Create a codec for the given role
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// The role this codec encodes and decodes for
    pub fn role(&self) -> Role {
        self.role
    }

    /// Serialize `text` into a single frame, masking it if the role
    /// requires masked output.
    ///
    /// Fails with [`FrameError::PayloadTooLarge`] when the text's byte
    /// length exceeds 125, since extended length encoding is out of
    /// scope.
    pub fn encode_text(&self, text: &str) -> Result<Bytes> {
        let payload = text.as_bytes();
        if payload.len() > MAX_SINGLE_FRAME_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_SINGLE_FRAME_PAYLOAD,
            }
            .into());
        }

        let mut buf = BytesMut::with_capacity(2 + MASKING_KEY_LEN + payload.len());
        buf.put_u8(FIN_BIT | Opcode::Text.value());

        if self.role.masks_output() {
            buf.put_u8(MASK_BIT | payload.len() as u8);
            let key = rand::random::<[u8; 4]>();
            buf.put_slice(&key);
            let start = buf.len();
            buf.put_slice(payload);
            apply_mask(&mut buf[start..], &key);
        } else {
            buf.put_u8(payload.len() as u8);
            buf.put_slice(payload);
        }

        Ok(buf.freeze())
    }

    /// Read one text frame from the stream and return its payload.
    ///
    /// `buf` carries bytes between calls (and may be pre-seeded with
    /// bytes that arrived with the handshake response).
    pub async fn read_text<S>(&self, stream: &mut S, buf: &mut BytesMut) -> Result<String>
    where
        S: TransportStream + ?Sized,
    {
        read_frame(stream, buf, self.role).await?.into_text()
    }

    /// Encode `text` and write the frame to the stream
    pub async fn write_text<S>(&self, stream: &mut S, text: &str) -> Result<()>
    where
        S: TransportStream + ?Sized,
    {
        let bytes = self.encode_text(text)?;
        stream.write_all(&bytes).await?;
        stream.flush().await
    }
}

/// Read from `stream` into `buf` until one complete frame parses.
///
/// A single read is not guaranteed to fill a buffer, so this loops;
/// short reads on slow or chunked transports never corrupt a frame. A
/// stream that ends while a frame is outstanding — including a peer
/// that claimed a payload length it never delivered — is an I/O error.
pub async fn read_frame<S>(stream: &mut S, buf: &mut BytesMut, role: Role) -> Result<Frame>
where
    S: TransportStream + ?Sized,
{
    loop {
        match Frame::parse(buf, role) {
            Ok(frame) => return Ok(frame),
            Err(Error::Frame(FrameError::InsufficientData { .. })) => {}
            Err(e) => return Err(e),
        }

        let mut chunk = [0u8; 256];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream ended before a complete frame",
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse_err(bytes: &[u8], role: Role) -> FrameError {
        let mut buf = BytesMut::from(bytes);
        match Frame::parse(&mut buf, role) {
            Err(Error::Frame(e)) => e,
            other => panic!("expected frame error, got {:?}", other),
        }
    }

    #[test]
    fn text_constructor_defaults() {
        let frame = Frame::text("abc");
        assert!(frame.fin);
        assert_eq!(frame.opcode, Opcode::Text);
        assert!(!frame.masked);
        assert_eq!(frame.payload_len(), 3);
    }

    #[test]
    fn encode_unmasked_text() {
        let codec = FrameCodec::new(Role::Responder);
        let bytes = codec.encode_text("hello").unwrap();

        assert_eq!(bytes[0], 0x81); // FIN=1, Opcode=0001
        assert_eq!(bytes[1], 0x05); // MASK=0, Length=5
        assert_eq!(&bytes[2..], b"hello");
    }

    #[test]
    fn encode_masked_text() {
        let codec = FrameCodec::new(Role::Initiator);
        let bytes = codec.encode_text("hello").unwrap();

        assert_eq!(bytes[0], 0x81);
        assert_eq!(bytes[1] & 0x80, 0x80); // MASK bit set
        assert_eq!(bytes[1] & 0x7F, 0x05);
        assert_eq!(bytes.len(), 2 + 4 + 5); // header + mask key + payload

        let mut payload = bytes[6..].to_vec();
        let mut key = [0u8; 4];
        key.copy_from_slice(&bytes[2..6]);
        apply_mask(&mut payload, &key);
        assert_eq!(&payload, b"hello");
    }

    #[test]
    fn encode_boundary_lengths() {
        let codec = FrameCodec::new(Role::Responder);
        assert!(codec.encode_text(&"x".repeat(125)).is_ok());

        match codec.encode_text(&"x".repeat(126)) {
            Err(Error::Frame(FrameError::PayloadTooLarge { len: 126, max: 125 })) => {}
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn parse_hello() {
        let mut buf = BytesMut::from(&[0x81, 0x05, b'H', b'e', b'l', b'l', b'o'][..]);
        let frame = Frame::parse(&mut buf, Role::Initiator).unwrap();

        assert!(frame.fin);
        assert_eq!(frame.opcode, Opcode::Text);
        assert!(!frame.masked);
        assert_eq!(frame.into_text().unwrap(), "Hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn parse_empty_payload() {
        let mut buf = BytesMut::from(&[0x81, 0x00][..]);
        let frame = Frame::parse(&mut buf, Role::Initiator).unwrap();
        assert_eq!(frame.into_text().unwrap(), "");
    }

    #[test]
    fn parse_rejects_fragmentation() {
        let err = parse_err(&[0x00, 0x05, 1, 2, 3, 4, 5], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedFragmentation);

        // fin clear with the text opcode set is still a fragment
        let err = parse_err(&[0x01, 0x00], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedFragmentation);
    }

    #[test]
    fn parse_rejects_non_text_opcodes() {
        let err = parse_err(&[0x82, 0x05, 1, 2, 3, 4, 5], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedFrameType(0x2));

        let err = parse_err(&[0x88, 0x00], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedFrameType(0x8));
    }

    #[test]
    fn parse_rejects_extended_lengths() {
        let err = parse_err(&[0x81, 126], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedExtendedLength(126));

        let err = parse_err(&[0x81, 127], Role::Initiator);
        assert_eq!(err, FrameError::UnsupportedExtendedLength(127));
    }

    #[test]
    fn initiator_rejects_masked_frames() {
        let err = parse_err(&[0x81, 0x80, 0x00, 0x00, 0x00, 0x00], Role::Initiator);
        assert_eq!(
            err,
            FrameError::MaskingPolicyViolation {
                masked: true,
                expected: false
            }
        );
    }

    #[test]
    fn responder_rejects_unmasked_frames() {
        let err = parse_err(&[0x81, 0x05, b'H', b'e', b'l', b'l', b'o'], Role::Responder);
        assert_eq!(
            err,
            FrameError::MaskingPolicyViolation {
                masked: false,
                expected: true
            }
        );
    }

    #[test]
    fn parse_reports_insufficient_data() {
        let err = parse_err(&[0x81], Role::Initiator);
        assert_eq!(err, FrameError::InsufficientData { needed: 2, have: 1 });

        // length claims 5 bytes but only 2 arrived so far
        let err = parse_err(&[0x81, 0x05, b'H', b'e'], Role::Initiator);
        assert_eq!(err, FrameError::InsufficientData { needed: 7, have: 4 });
    }

    #[test]
    fn parse_leaves_following_bytes() {
        let mut buf = BytesMut::from(&[0x81, 0x02, b'h', b'i', 0x81, 0x00][..]);
        let frame = Frame::parse(&mut buf, Role::Initiator).unwrap();
        assert_eq!(frame.into_text().unwrap(), "hi");
        assert_eq!(&buf[..], &[0x81, 0x00]);
    }

    #[test]
    fn mask_is_involution() {
        let mut data = b"The quick brown fox".to_vec();
        let original = data.clone();
        let key = [0xA5, 0x3C, 0x0F, 0x99];

        apply_mask(&mut data, &key);
        assert_ne!(data, original);
        apply_mask(&mut data, &key);
        assert_eq!(data, original);
    }

    #[test]
    fn mask_cycles_every_four_bytes() {
        let mut data = vec![0u8; 8];
        let key = [1, 2, 3, 4];
        apply_mask(&mut data, &key);
        assert_eq!(data, vec![1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn read_frame_survives_trickled_reads() {
        use crate::transport::mock::MockStream;

        // one byte per read call; the loop must reassemble the frame
        let mut stream =
            MockStream::new(&[0x81, 0x05, b'H', b'e', b'l', b'l', b'o'][..]).with_max_read(1);
        let mut buf = BytesMut::new();

        let frame = read_frame(&mut stream, &mut buf, Role::Initiator).await.unwrap();
        assert_eq!(frame.into_text().unwrap(), "Hello");
    }

    #[tokio::test]
    async fn read_frame_rejects_undelivered_payload() {
        use crate::transport::mock::MockStream;

        // header claims 5 payload bytes, stream delivers 2 then ends
        let mut stream = MockStream::new(&[0x81, 0x05, b'H', b'e'][..]);
        let mut buf = BytesMut::new();

        match read_frame(&mut stream, &mut buf, Role::Initiator).await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn codec_read_and_write_text() {
        use crate::transport::mock::MockStream;

        let responder = FrameCodec::new(Role::Responder);
        let mut stream = MockStream::new(Vec::new());
        responder.write_text(&mut stream, "greetings").await.unwrap();

        let initiator = FrameCodec::new(Role::Initiator);
        let mut incoming = MockStream::new(stream.written.clone());
        let mut buf = BytesMut::new();
        let text = initiator.read_text(&mut incoming, &mut buf).await.unwrap();
        assert_eq!(text, "greetings");
    }

    proptest! {
        #[test]
        fn round_trip_unmasked(text in "[ -~]{0,125}") {
            let codec = FrameCodec::new(Role::Responder);
            let bytes = codec.encode_text(&text).unwrap();
            let mut buf = BytesMut::from(&bytes[..]);
            let frame = Frame::parse(&mut buf, Role::Initiator).unwrap();
            prop_assert_eq!(frame.into_text().unwrap(), text);
            prop_assert!(buf.is_empty());
        }

        #[test]
        fn round_trip_masked(text in "[ -~]{0,125}") {
            let codec = FrameCodec::new(Role::Initiator);
            let bytes = codec.encode_text(&text).unwrap();
            let mut buf = BytesMut::from(&bytes[..]);
            let frame = Frame::parse(&mut buf, Role::Responder).unwrap();
            prop_assert!(frame.masked);
            prop_assert_eq!(frame.into_text().unwrap(), text);
        }
    }
}
