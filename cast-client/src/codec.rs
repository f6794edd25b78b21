use std::convert::TryFrom;
use std::io;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use protobuf::Message;
use tokio_codec::{Decoder, Encoder};

use crate::proto::CastMessage;

/// Protobuf header is a big endian u32.
const CAST_MESSAGE_HEADER_LENGTH: usize = 4;
/// Max message size is [64KB](https://developers.google.com/cast/docs/reference/messages).
const CAST_MESSAGE_PROTOBUF_MAX_LENGTH: usize = 64 << 10;

/// `CastMessage` frames are length-prefixed protobufs. This enum represents
/// the phase of the decoding. Keep track of the decode phase to ensure the
/// decoder does not drop bytes from the `BytesMut`.
#[derive(Debug)]
enum DecodeState {
    /// Waiting to read a u32 representing the size of the next protobuf.
    Header,
    /// Reading a protobuf with a given length.
    Payload(usize),
}

impl Default for DecodeState {
    fn default() -> Self {
        DecodeState::Header
    }
}

#[derive(Debug, Default)]
pub struct CastMessageCodec {
    state: DecodeState,
    decoded_frames: u64,
    encoded_frames: u64,
}

fn frame_too_large(length: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "cast frame of length {} exceeds the max message length of {}",
            length, CAST_MESSAGE_PROTOBUF_MAX_LENGTH
        ),
    )
}

impl Encoder for CastMessageCodec {
    type Item = CastMessage;
    type Error = io::Error;

    fn encode(&mut self, item: Self::Item, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let buf = item
            .write_to_bytes()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        if buf.len() > CAST_MESSAGE_PROTOBUF_MAX_LENGTH {
            return Err(frame_too_large(buf.len()));
        }

        // Cast wire protocol is a 4-byte big endian length-prefixed protobuf.
        let header = &mut [0; CAST_MESSAGE_HEADER_LENGTH];
        let msg_size =
            u32::try_from(buf.len()).map_err(|_| frame_too_large(buf.len()))?;
        BigEndian::write_u32(header, msg_size);

        dst.reserve(CAST_MESSAGE_HEADER_LENGTH + buf.len());
        dst.put_slice(header);
        dst.put_slice(&buf);
        self.encoded_frames += 1;
        trace!(
            "codec encoded frame {} in namespace {}",
            self.encoded_frames,
            item.get_namespace()
        );
        Ok(())
    }
}

impl CastMessageCodec {
    /// At least 4 bytes are required to decode the next frame. Read the length
    /// of the following protobuf and reserve that much capacity in the
    /// `BytesMut`.
    fn decode_header(&mut self, src: &mut BytesMut) -> Result<Option<usize>, io::Error> {
        if src.len() < CAST_MESSAGE_HEADER_LENGTH {
            return Ok(None);
        }
        let header = src.split_to(CAST_MESSAGE_HEADER_LENGTH);
        let length = BigEndian::read_u32(&header) as usize;
        if length > CAST_MESSAGE_PROTOBUF_MAX_LENGTH {
            return Err(frame_too_large(length));
        }
        src.reserve(length);
        Ok(Some(length))
    }

    fn try_decode(&mut self, src: &mut BytesMut) -> Result<Option<CastMessage>, io::Error> {
        let n = match self.state {
            DecodeState::Header => match self.decode_header(src)? {
                Some(n) => n,
                None => return Ok(None),
            },
            DecodeState::Payload(n) => n,
        };
        if src.len() < n {
            self.state = DecodeState::Payload(n);
            return Ok(None);
        }
        self.state = DecodeState::Header;
        let payload = src.split_to(n);
        src.reserve(CAST_MESSAGE_HEADER_LENGTH);
        let message = protobuf::parse_from_bytes::<CastMessage>(&payload)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.decoded_frames += 1;
        trace!(
            "codec decoded frame {} in namespace {}",
            self.decoded_frames,
            message.get_namespace()
        );
        Ok(Some(message))
    }
}

impl Decoder for CastMessageCodec {
    type Item = CastMessage;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let item = self.try_decode(src);
        if let Err(ref err) = item {
            warn!("Error in decoder: {:?}", err);
        }
        item
    }
}
