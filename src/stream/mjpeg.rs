//! multipart/x-mixed-replace encoding of the frame store

use std::convert::Infallible;

use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::{self, Stream};

use super::FrameStore;

pub const BOUNDARY: &str = "frame";

pub fn content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={}", BOUNDARY)
}

/// One multipart section carrying a single JPEG.
pub fn encode_part(jpeg: &[u8]) -> Bytes {
    let header = format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY,
        jpeg.len()
    );
    let mut buf = BytesMut::with_capacity(header.len() + jpeg.len() + 2);
    buf.put_slice(header.as_bytes());
    buf.put_slice(jpeg);
    buf.put_slice(b"\r\n");
    buf.freeze()
}

/// Endless body of multipart sections, one per new non-empty frame.
///
/// Ends when the store is closed or the client goes away (the stream is dropped).
pub fn frame_stream(store: &FrameStore) -> impl Stream<Item = Result<Bytes, Infallible>> {
    stream::unfold(store.subscribe(), |mut sub| async move {
        loop {
            let frame = sub.next().await?;
            if !frame.jpeg.is_empty() {
                return Some((Ok(encode_part(&frame.jpeg)), sub));
            }
        }
    })
}
