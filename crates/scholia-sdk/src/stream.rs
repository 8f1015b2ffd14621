//! Incremental text decoding of a chunked response body.
//!
//! The chat endpoint streams raw text with no framing. Network chunk
//! boundaries are arbitrary and may fall inside a multi-byte UTF-8
//! sequence, so bytes are run through [`Utf8ChunkDecoder`], which holds back
//! an incomplete trailing sequence until the next chunk completes it.

use futures::Stream;

use crate::error::SdkError;

// ---------------------------------------------------------------------------
// Utf8ChunkDecoder
// ---------------------------------------------------------------------------

/// Streaming UTF-8 decoder.
///
/// Invalid sequences decode to U+FFFD; an incomplete sequence at the end of
/// input is flushed as U+FFFD by [`finish`](Self::finish).
///
/// # Examples
///
/// ```
/// use scholia_sdk::Utf8ChunkDecoder;
///
/// let bytes = "اے".as_bytes();
/// let mut decoder = Utf8ChunkDecoder::default();
/// assert_eq!(decoder.push(&bytes[..1]), "");
/// assert_eq!(decoder.push(&bytes[1..]), "اے");
/// assert_eq!(decoder.finish(), "");
/// ```
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Feed `bytes` and return every character that is now complete.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

// ---------------------------------------------------------------------------
// TextStream
// ---------------------------------------------------------------------------

/// A finite, ordered sequence of text segments read from a response body.
///
/// Segments are yielded as soon as they arrive; nothing is buffered beyond
/// an incomplete trailing UTF-8 sequence.
#[derive(Debug)]
pub struct TextStream {
    response: reqwest::Response,
    decoder: Utf8ChunkDecoder,
    finished: bool,
}

impl TextStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            decoder: Utf8ChunkDecoder::default(),
            finished: false,
        }
    }

    /// Read the next non-empty text segment.
    ///
    /// Returns `Ok(None)` once the body has ended. A transport failure
    /// after the first byte is reported as [`SdkError::StreamInterrupted`]
    /// and ends the stream.
    pub async fn next_chunk(&mut self) -> Result<Option<String>, SdkError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.response.chunk().await {
                Ok(Some(bytes)) => {
                    let text = self.decoder.push(&bytes);
                    if !text.is_empty() {
                        return Ok(Some(text));
                    }
                }
                Ok(None) => {
                    self.finished = true;
                    let tail = self.decoder.finish();
                    return Ok((!tail.is_empty()).then_some(tail));
                }
                Err(e) => {
                    self.finished = true;
                    return Err(SdkError::StreamInterrupted(e.to_string()));
                }
            }
        }
    }

    /// Adapt into a [`Stream`] that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, SdkError>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
