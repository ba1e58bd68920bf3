// Copyright 2026 The Paxos Store Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The wire framing codec: `HEADER(5 bytes) || JSON payload`.
//!
//! A `tokio_util::codec` `Decoder`/`Encoder` pair, without any transport
//! encryption layer. This wire format authenticates a subset of kinds but
//! never encrypts.

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::messages::{self, Kind, Message};

#[derive(Debug, Default)]
pub struct MessageCodec;

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        if buf.len() < messages::Header::SIZE {
            return Ok(None);
        }

        let length = BigEndian::read_u32(&buf[0..4]) as usize;
        let kind_byte = buf[4];

        if buf.len() < messages::Header::SIZE + length {
            return Ok(None);
        }

        let kind = Kind::from_u8(kind_byte)
            .ok_or_else(|| ProtocolError::Decode(format!("unknown kind byte: {}", kind_byte)))?;

        buf.advance(messages::Header::SIZE);
        let payload = buf.split_to(length);

        decode_payload(kind, &payload).map(Some)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let payload = encode_payload(&message)?;
        let kind = message.kind();

        buf.reserve(messages::Header::SIZE + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.put_u8(kind as u8);
        buf.extend_from_slice(&payload);
        Ok(())
    }
}

fn encode_payload(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let result = match message {
        Message::Accept(m) => serde_json::to_vec(m),
        Message::Accepted(m) => serde_json::to_vec(m),
        Message::Acknowledge(m) => serde_json::to_vec(m),
        Message::Client(m) => serde_json::to_vec(m),
        Message::Denied(m) => serde_json::to_vec(m),
        Message::Found(m) => serde_json::to_vec(m),
        Message::Learn(m) => serde_json::to_vec(m),
        Message::Prepare(m) => serde_json::to_vec(m),
        Message::Promise(m) => serde_json::to_vec(m),
        Message::Search(m) => serde_json::to_vec(m),
        Message::Server(m) => serde_json::to_vec(m),
        Message::Write(m) => serde_json::to_vec(m),
        Message::Wrote(m) => serde_json::to_vec(m),
    };

    result.map_err(|err| ProtocolError::Decode(err.to_string()))
}

fn decode_payload(kind: Kind, payload: &[u8]) -> Result<Message, ProtocolError> {
    let decode_err = |err: serde_json::Error| ProtocolError::Decode(err.to_string());

    Ok(match kind {
        Kind::Accept => Message::Accept(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Accepted => Message::Accepted(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Acknowledge => {
            Message::Acknowledge(serde_json::from_slice(payload).map_err(decode_err)?)
        }
        Kind::Client => Message::Client(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Denied => Message::Denied(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Found => Message::Found(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Learn => Message::Learn(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Prepare => Message::Prepare(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Promise => Message::Promise(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Search => Message::Search(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Server => Message::Server(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Write => Message::Write(serde_json::from_slice(payload).map_err(decode_err)?),
        Kind::Wrote => Message::Wrote(serde_json::from_slice(payload).map_err(decode_err)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Prepare, Write};
    use pretty_assertions::assert_eq;

    fn round_trip(message: Message) {
        let mut codec = MessageCodec;
        let mut buf = BytesMut::new();
        codec.encode(message.clone(), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().expect("a full frame");
        assert_eq!(decoded, message);
        assert!(buf.is_empty());
    }

    #[test]
    fn round_trips_every_kind() {
        round_trip(Message::Write(Write {
            value: "hello".to_owned(),
        }));
        round_trip(Message::Prepare(Prepare {
            proposal: 123,
            hash: "deadbeef".to_owned(),
        }));
    }

    #[test]
    fn header_is_exactly_five_bytes() {
        let mut codec = MessageCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(
                Message::Write(Write {
                    value: "x".to_owned(),
                }),
                &mut buf,
            )
            .unwrap();

        let length = BigEndian::read_u32(&buf[0..4]) as usize;
        assert_eq!(buf.len(), messages::Header::SIZE + length);
    }

    #[test]
    fn incomplete_frame_yields_none_without_consuming() {
        let mut codec = MessageCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(
                Message::Write(Write {
                    value: "hello".to_owned(),
                }),
                &mut buf,
            )
            .unwrap();

        let mut partial = buf.split_to(buf.len() - 1);
        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn unknown_kind_byte_is_rejected() {
        let mut codec = MessageCodec;
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_u8(99);
        buf.extend_from_slice(b"{}");

        assert!(codec.decode(&mut buf).is_err());
    }
}
